use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the download URL of a dependency was chosen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum UrlOrigin {
    /// Version pinned through configuration
    Pinned { label: String, version: String },
    /// Discovered through the dependency's release channel
    Latest { label: String },
    /// Fixed prebuilt bundle
    Bundle,
}

/// Source acquisition events - cache lookups, release discovery, downloads and unpacking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AcquisitionEvent {
    /// A cached archive satisfied the dependency
    CacheHit { dependency: String, path: PathBuf },

    /// Latest release lookup started
    ResolveStarted { dependency: String, channel: String },

    /// Latest release lookup finished
    Resolved { dependency: String, url: String },

    /// A bearer token is attached to a release API request
    AuthenticatedRequest { url: String },

    /// Archive download started
    DownloadStarted {
        dependency: String,
        url: String,
        origin: UrlOrigin,
    },

    /// Archive download finished
    DownloadCompleted {
        dependency: String,
        path: PathBuf,
        bytes: u64,
    },

    /// Archive unpacking started
    ExtractStarted { archive: PathBuf, destination: PathBuf },

    /// Archive unpacking finished
    ExtractCompleted { archive: PathBuf },
}
