//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// xsdeps - static dependency builds for the xmlsec Python extension
#[derive(Parser)]
#[command(name = "xsdeps")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Static dependency builds for the xmlsec Python extension")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Build the native dependencies from source and link them statically
    #[arg(long = "static", global = true)]
    pub static_deps: bool,

    /// Target architecture (macOS cross-compiles between x86_64 and arm64)
    #[arg(long, global = true, value_name = "ARCH")]
    pub target_arch: Option<String>,

    /// Pin a dependency version, e.g. `--pin openssl=3.6.0`
    #[arg(long, global = true, value_name = "DEP=VERSION")]
    pub pin: Vec<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Provide the dependencies and print the extension settings as JSON
    Configure {
        /// Write the settings to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the download URL of the newest release of a dependency
    Resolve {
        /// Dependency name (openssl, zlib, libiconv, libxml2, libxslt, xmlsec1)
        dependency: String,
    },

    /// Make sure every source archive is in the cache
    Fetch,

    /// Show the build order and commands without running anything
    Plan,
}
