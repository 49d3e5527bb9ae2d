#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for xsdeps
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (`xsdeps.toml` or `--config`)
//! - Environment variables
//! - CLI flags (applied by the front end)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use xsdeps_errors::{ConfigError, Error};
use xsdeps_types::{DependencyKind, DependencySpec, Endpoints};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub paths: PathConfig,

    /// Pinned versions keyed by dependency (`openssl = "3.6.0"`)
    #[serde(default)]
    pub versions: BTreeMap<DependencyKind, String>,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub endpoints: Endpoints,

    #[serde(default)]
    pub extension: ExtensionSettings,
}

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Build the native dependencies from source and link them statically
    #[serde(default)]
    pub static_deps: bool,
    #[serde(default)]
    pub build_jobs: usize, // 0 = auto-detect
    /// Requested target architecture; the host machine when unset
    #[serde(default)]
    pub target_arch: Option<String>,
    #[serde(default)]
    pub enable_debug: bool,
    #[serde(default = "default_optimize_size")]
    pub optimize_size: bool,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub libs_dir: Option<PathBuf>,
    pub build_root: Option<PathBuf>,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    /// Bearer token for the release API; never written back out
    #[serde(default, skip_serializing)]
    pub github_token: Option<String>,
}

/// Settings consumed by the extension configurator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionSettings {
    #[serde(default)]
    pub module_name: Option<String>,
    #[serde(default)]
    pub module_version: Option<String>,
    /// Explicit lxml include directories; probed through Python when empty
    #[serde(default)]
    pub xml_tree_include_dirs: Vec<PathBuf>,
    #[serde(default = "default_python")]
    pub python: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            static_deps: false,
            build_jobs: 0,
            target_arch: None,
            enable_debug: false,
            optimize_size: true,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: 300, // 5 minutes
            github_token: None,
        }
    }
}

impl Default for ExtensionSettings {
    fn default() -> Self {
        Self {
            module_name: None,
            module_version: None,
            xml_tree_include_dirs: Vec::new(),
            python: default_python(),
        }
    }
}

fn default_optimize_size() -> bool {
    true
}

fn default_timeout() -> u64 {
    300
}

fn default_python() -> String {
    "python3".to_string()
}

/// Parse a boolean environment value
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` naming `field` for anything outside
/// `1/true/yes/on` and `0/false/no/off`.
pub fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

fn env_bool(field: &str) -> Result<Option<bool>, ConfigError> {
    match std::env::var(field) {
        Ok(value) => parse_bool(field, &value).map(Some),
        Err(_) => Ok(None),
    }
}

fn env_nonempty(field: &str) -> Option<String> {
    std::env::var(field).ok().filter(|value| !value.is_empty())
}

impl Config {
    /// Config file picked up from the working directory when `--config` is absent
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathBuf::from("xsdeps.toml")
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration from an optional path or use default
    ///
    /// If path is provided, loads from that file. Otherwise `xsdeps.toml` is
    /// used when present and hard-coded defaults when not.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    Self::load_from_file(&default_path).await
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Some(value) = env_bool("XSDEPS_STATIC_DEPS")? {
            self.build.static_deps = value;
        }

        if let Some(value) = env_bool("XSDEPS_ENABLE_DEBUG")? {
            self.build.enable_debug = value;
        }

        if let Some(value) = env_bool("XSDEPS_OPTIMIZE_SIZE")? {
            self.build.optimize_size = value;
        }

        if let Some(arch) = env_nonempty("XSDEPS_TARGET_ARCH") {
            self.build.target_arch = Some(arch);
        }

        if let Ok(jobs) = std::env::var("XSDEPS_BUILD_JOBS") {
            self.build.build_jobs = jobs.parse().map_err(|_| ConfigError::InvalidValue {
                field: "XSDEPS_BUILD_JOBS".to_string(),
                value: jobs,
            })?;
        }

        if let Some(dir) = env_nonempty("XSDEPS_LIBS_DIR") {
            self.paths.libs_dir = Some(PathBuf::from(dir));
        }

        if let Some(dir) = env_nonempty("XSDEPS_BUILD_ROOT") {
            self.paths.build_root = Some(PathBuf::from(dir));
        }

        for kind in DependencyKind::BUILD_ORDER {
            if let Some(version) = env_nonempty(kind.version_env()) {
                self.versions.insert(kind, version);
            }
        }

        if let Some(dirs) = std::env::var_os("XSDEPS_LXML_INCLUDE").filter(|v| !v.is_empty()) {
            self.extension.xml_tree_include_dirs = std::env::split_paths(&dirs).collect();
        }

        if let Some(token) = env_nonempty("GH_TOKEN").or_else(|| env_nonempty("GITHUB_TOKEN")) {
            self.network.github_token = Some(token);
        }

        Ok(())
    }

    /// Pin a dependency version given by name (CLI `--pin openssl=3.6.0`)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownDependency` if the name is not one of the
    /// six dependencies.
    pub fn pin(&mut self, name: &str, version: impl Into<String>) -> Result<(), Error> {
        let kind = name
            .parse::<DependencyKind>()
            .map_err(|_| ConfigError::UnknownDependency {
                name: name.to_string(),
            })?;
        self.versions.insert(kind, version.into());
        Ok(())
    }

    /// Dependency specs in build order with the configured pins applied
    #[must_use]
    pub fn dependency_specs(&self) -> Vec<DependencySpec> {
        DependencySpec::all_in_build_order(&self.versions)
    }

    /// Archive cache directory (with default)
    #[must_use]
    pub fn libs_dir(&self) -> PathBuf {
        self.paths
            .libs_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("libs"))
    }

    /// Scratch root (with default)
    #[must_use]
    pub fn build_root(&self) -> PathBuf {
        self.paths
            .build_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("build").join("tmp"))
    }

    /// Installation prefix shared by every dependency
    #[must_use]
    pub fn prefix_dir(&self) -> PathBuf {
        self.build_root().join("prefix")
    }

    /// Directory archives are extracted into
    #[must_use]
    pub fn scratch_dir(&self) -> PathBuf {
        self.build_root().join("libs")
    }
}

/// Parallel job hint for `make`
///
/// A non-zero configured value wins; otherwise one more than the CPU count.
#[must_use]
pub fn calculate_build_jobs(config_value: usize) -> usize {
    if config_value > 0 {
        config_value
    } else {
        num_cpus::get() + 1
    }
}
