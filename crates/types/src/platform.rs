//! Platform descriptions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating system family the extension is built for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
    Linux,
    MacOs,
    Windows,
    Other(String),
}

impl TargetOs {
    /// The operating system this binary was compiled for
    #[must_use]
    pub fn current() -> Self {
        std::env::consts::OS
            .parse()
            .unwrap_or_else(|_| Self::Other(std::env::consts::OS.to_string()))
    }

    /// Whether dependencies are built from source on this platform
    #[must_use]
    pub fn is_unix_like(&self) -> bool {
        matches!(self, Self::Linux | Self::MacOs)
    }
}

impl FromStr for TargetOs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        if lowered.is_empty() {
            return Err("empty platform name".to_string());
        }
        Ok(match lowered.as_str() {
            "linux" => Self::Linux,
            "macos" | "darwin" | "macosx" => Self::MacOs,
            "windows" | "win32" | "win64" => Self::Windows,
            _ if lowered.starts_with("linux") => Self::Linux,
            _ => Self::Other(lowered),
        })
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::MacOs => write!(f, "darwin"),
            Self::Windows => write!(f, "win32"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Cross-compilation target consumed by OpenSSL's `Configure`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossCompileInfo {
    pub host: String,
    pub arch: String,
    pub compiler: String,
}

impl CrossCompileInfo {
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        arch: impl Into<String>,
        compiler: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            arch: arch.into(),
            compiler: compiler.into(),
        }
    }

    /// `host-arch-compiler`, e.g. `darwin64-x86_64-cc`
    #[must_use]
    pub fn triplet(&self) -> String {
        format!("{}-{}-{}", self.host, self.arch, self.compiler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_platform_names() {
        assert_eq!("darwin".parse::<TargetOs>().unwrap(), TargetOs::MacOs);
        assert_eq!("win32".parse::<TargetOs>().unwrap(), TargetOs::Windows);
        assert_eq!("linux2".parse::<TargetOs>().unwrap(), TargetOs::Linux);
        assert_eq!(
            "freebsd".parse::<TargetOs>().unwrap(),
            TargetOs::Other("freebsd".into())
        );
    }

    #[test]
    fn test_triplet() {
        let info = CrossCompileInfo::new("darwin64", "x86_64", "cc");
        assert_eq!(info.triplet(), "darwin64-x86_64-cc");
    }
}
