//! The six statically built dependencies and their fixed build order

use crate::endpoints::join_url;
use crate::{Endpoints, ReleaseAsset, ReleaseChannel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A dependency of the static toolchain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    OpenSsl,
    Zlib,
    Libiconv,
    Libxml2,
    Libxslt,
    Xmlsec1,
}

impl DependencyKind {
    /// Build order. Each configure step finds its predecessors through the
    /// shared prefix, so this order must not change.
    pub const BUILD_ORDER: [Self; 6] = [
        Self::OpenSsl,
        Self::Zlib,
        Self::Libiconv,
        Self::Libxml2,
        Self::Libxslt,
        Self::Xmlsec1,
    ];

    /// Display name used in progress output
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::OpenSsl => "OpenSSL",
            Self::Zlib => "zlib",
            Self::Libiconv => "libiconv",
            Self::Libxml2 => "libxml2",
            Self::Libxslt => "libxslt",
            Self::Xmlsec1 => "xmlsec1",
        }
    }

    /// Lowercase key used in configuration files and on the command line
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::OpenSsl => "openssl",
            Self::Zlib => "zlib",
            Self::Libiconv => "libiconv",
            Self::Libxml2 => "libxml2",
            Self::Libxslt => "libxslt",
            Self::Xmlsec1 => "xmlsec1",
        }
    }

    /// Glob that detects an already cached archive
    #[must_use]
    pub fn archive_glob(self) -> &'static str {
        match self {
            Self::OpenSsl => "openssl*.tar.gz",
            Self::Zlib => "zlib*.tar.gz",
            Self::Libiconv => "libiconv*.tar.gz",
            Self::Libxml2 => "libxml2*.tar.xz",
            Self::Libxslt => "libxslt*.tar.xz",
            Self::Xmlsec1 => "xmlsec1*.tar.gz",
        }
    }

    /// Filename a fresh download is stored under
    #[must_use]
    pub fn archive_filename(self) -> &'static str {
        match self {
            Self::OpenSsl => "openssl.tar.gz",
            Self::Zlib => "zlib.tar.gz",
            Self::Libiconv => "libiconv.tar.gz",
            Self::Libxml2 => "libxml2.tar.xz",
            Self::Libxslt => "libxslt.tar.xz",
            Self::Xmlsec1 => "xmlsec1.tar.gz",
        }
    }

    /// Glob matching the top-level directory the archive unpacks to
    #[must_use]
    pub fn source_dir_glob(self) -> &'static str {
        match self {
            Self::OpenSsl => "openssl-*",
            Self::Zlib => "zlib-*",
            Self::Libiconv => "libiconv-*",
            Self::Libxml2 => "libxml2-*",
            Self::Libxslt => "libxslt-*",
            Self::Xmlsec1 => "xmlsec1-*",
        }
    }

    /// Environment variable that pins this dependency's version
    #[must_use]
    pub fn version_env(self) -> &'static str {
        match self {
            Self::OpenSsl => "XSDEPS_OPENSSL_VERSION",
            Self::Zlib => "XSDEPS_ZLIB_VERSION",
            Self::Libiconv => "XSDEPS_LIBICONV_VERSION",
            Self::Libxml2 => "XSDEPS_LIBXML2_VERSION",
            Self::Libxslt => "XSDEPS_LIBXSLT_VERSION",
            Self::Xmlsec1 => "XSDEPS_XMLSEC1_VERSION",
        }
    }

    /// Download URL of a specific version
    #[must_use]
    pub fn pinned_url(self, endpoints: &Endpoints, version: &str) -> String {
        match self {
            Self::OpenSsl => join_url(
                &endpoints.github_api,
                &format!("repos/openssl/openssl/tarball/openssl-{version}"),
            ),
            Self::Zlib => join_url(&endpoints.zlib_index, &format!("zlib-{version}.tar.gz")),
            Self::Libiconv => join_url(
                &endpoints.libiconv_index,
                &format!("libiconv-{version}.tar.gz"),
            ),
            Self::Libxml2 | Self::Libxslt => {
                let project = self.key();
                let series = version.rsplit_once('.').map_or(version, |(head, _)| head);
                join_url(
                    &endpoints.gnome_sources,
                    &format!("{project}/{series}/{project}-{version}.tar.xz"),
                )
            }
            Self::Xmlsec1 => join_url(
                &endpoints.github_web,
                &format!("lsh123/xmlsec/releases/download/{version}/xmlsec1-{version}.tar.gz"),
            ),
        }
    }

    /// The channel publishing this dependency's releases
    #[must_use]
    pub fn release_channel(self, endpoints: &Endpoints) -> ReleaseChannel {
        match self {
            Self::OpenSsl => ReleaseChannel::ReleaseApi {
                api_base: endpoints.github_api.clone(),
                repo: "openssl/openssl".to_string(),
                asset: ReleaseAsset::Tarball,
            },
            Self::Zlib => ReleaseChannel::HtmlIndex {
                base_url: endpoints.zlib_index.clone(),
                pattern: r"^zlib-(?P<version>.+)\.tar\.gz$".to_string(),
            },
            Self::Libiconv => ReleaseChannel::HtmlIndex {
                base_url: endpoints.libiconv_index.clone(),
                pattern: r"^libiconv-(?P<version>.+)\.tar\.gz$".to_string(),
            },
            Self::Libxml2 | Self::Libxslt => ReleaseChannel::JsonManifest {
                base_url: join_url(&endpoints.gnome_sources, self.key()),
                project: self.key().to_string(),
            },
            Self::Xmlsec1 => ReleaseChannel::ReleaseApi {
                api_base: endpoints.github_api.clone(),
                repo: "lsh123/xmlsec".to_string(),
                asset: ReleaseAsset::Suffix(".tar.gz".to_string()),
            },
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DependencyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openssl" => Ok(Self::OpenSsl),
            "zlib" => Ok(Self::Zlib),
            "libiconv" | "iconv" => Ok(Self::Libiconv),
            "libxml2" => Ok(Self::Libxml2),
            "libxslt" => Ok(Self::Libxslt),
            "xmlsec1" | "xmlsec" => Ok(Self::Xmlsec1),
            other => Err(format!("unknown dependency: {other}")),
        }
    }
}

/// Static description of one dependency for a single orchestrator run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub kind: DependencyKind,
    /// `None` means "resolve the latest release"
    pub pinned_version: Option<String>,
}

impl DependencySpec {
    #[must_use]
    pub fn new(kind: DependencyKind, pinned_version: Option<String>) -> Self {
        Self {
            kind,
            pinned_version,
        }
    }

    /// Specs for every dependency in build order, pinned where configured
    #[must_use]
    pub fn all_in_build_order(pins: &BTreeMap<DependencyKind, String>) -> Vec<Self> {
        DependencyKind::BUILD_ORDER
            .iter()
            .map(|kind| Self::new(*kind, pins.get(kind).cloned()))
            .collect()
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    #[must_use]
    pub fn glob(&self) -> &'static str {
        self.kind.archive_glob()
    }

    #[must_use]
    pub fn filename(&self) -> &'static str {
        self.kind.archive_filename()
    }

    /// URL for the pinned version, if one is pinned
    #[must_use]
    pub fn pinned_url(&self, endpoints: &Endpoints) -> Option<String> {
        self.pinned_version
            .as_deref()
            .map(|version| self.kind.pinned_url(endpoints, version))
    }

    #[must_use]
    pub fn release_channel(&self, endpoints: &Endpoints) -> ReleaseChannel {
        self.kind.release_channel(endpoints)
    }
}
