//! Upstream hosts for every release channel

use serde::{Deserialize, Serialize};

/// Base URLs of the upstream release channels
///
/// Each dependency is bound to exactly one channel; these values only move
/// the channel to another host (mirrors, test servers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub github_api: String,
    pub github_web: String,
    pub zlib_index: String,
    pub libiconv_index: String,
    pub gnome_sources: String,
    pub windows_bundles: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            github_api: "https://api.github.com".to_string(),
            github_web: "https://github.com".to_string(),
            zlib_index: "https://zlib.net/fossils".to_string(),
            libiconv_index: "https://ftpmirror.gnu.org/libiconv".to_string(),
            gnome_sources: "https://download.gnome.org/sources".to_string(),
            windows_bundles:
                "https://github.com/mxamin/python-xmlsec-win-binaries/releases/download/2025.07.10"
                    .to_string(),
        }
    }
}

impl Endpoints {
    /// Every endpoint rooted at one base URL (used against local mirrors)
    #[must_use]
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            github_api: format!("{base}/api"),
            github_web: format!("{base}/web"),
            zlib_index: format!("{base}/zlib"),
            libiconv_index: format!("{base}/libiconv"),
            gnome_sources: format!("{base}/gnome"),
            windows_bundles: format!("{base}/bundles"),
        }
    }
}

/// Join a base URL and a relative path with exactly one slash
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
