//! Settings for linking against a system xmlsec1 found through pkg-config

use crate::descriptor::ExtensionConfig;
use xsdeps_builder::{CommandRunner, Invocation};
use xsdeps_errors::{Error, ExtensionError};

/// pkg-config package the extension links against
pub const PACKAGE: &str = "xmlsec1";

/// Query pkg-config for xmlsec1
///
/// # Errors
///
/// Returns `PkgConfigUnavailable` if pkg-config cannot be run,
/// `PackageNotFound` if it does not know the package, and `IncompleteResult`
/// if the answer names no libraries.
pub async fn configure(runner: &dyn CommandRunner) -> Result<ExtensionConfig, Error> {
    let invocation = Invocation::new("pkg-config").args(["--cflags", "--libs", PACKAGE]);
    let output = runner.capture(&invocation).await.map_err(|e| {
        ExtensionError::PkgConfigUnavailable {
            message: e.to_string(),
        }
    })?;

    if !output.status.success() {
        return Err(ExtensionError::PackageNotFound {
            package: PACKAGE.to_string(),
        }
        .into());
    }

    Ok(parse_flags(&output.stdout)?)
}

/// Turn pkg-config compiler and linker flags into extension settings
///
/// # Errors
///
/// Returns `IncompleteResult` if no `-l` flag is present.
pub fn parse_flags(flags: &str) -> Result<ExtensionConfig, ExtensionError> {
    let mut config = ExtensionConfig::default();

    for token in flags.split_whitespace() {
        if let Some(define) = token.strip_prefix("-D") {
            match define.split_once('=') {
                Some((name, value)) => config.push_macro(name, Some(value.to_string())),
                None => config.push_macro(define, None),
            }
        } else if let Some(dir) = token.strip_prefix("-I") {
            config.push_include_dir(dir);
        } else if let Some(dir) = token.strip_prefix("-L") {
            config.push_library_dir(dir);
        } else if let Some(lib) = token.strip_prefix("-l") {
            config.push_library(lib);
        }
    }

    if config.libraries().is_empty() {
        return Err(ExtensionError::IncompleteResult);
    }
    Ok(config)
}
