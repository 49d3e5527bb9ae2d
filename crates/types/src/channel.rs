//! Release discovery channels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which asset of a hosted release is the source archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseAsset {
    /// The release's generated source tarball
    Tarball,
    /// The single uploaded asset whose name ends with the suffix
    Suffix(String),
}

/// The upstream mechanism through which a dependency publishes releases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReleaseChannel {
    /// HTML directory listing; `pattern` captures a `version` group from each link
    HtmlIndex { base_url: String, pattern: String },
    /// `cache.json` source manifest keyed by project
    JsonManifest { base_url: String, project: String },
    /// Hosted "latest release" JSON API
    ReleaseApi {
        api_base: String,
        repo: String,
        asset: ReleaseAsset,
    },
}

impl fmt::Display for ReleaseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlIndex { base_url, .. } => write!(f, "html-index {base_url}"),
            Self::JsonManifest { base_url, project } => {
                write!(f, "json-manifest {base_url} ({project})")
            }
            Self::ReleaseApi { repo, .. } => write!(f, "release-api {repo}"),
        }
    }
}
