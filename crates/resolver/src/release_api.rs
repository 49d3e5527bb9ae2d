//! Hosted release API (`/repos/{repo}/releases/latest`)

use serde::Deserialize;
use xsdeps_errors::ResolveError;
use xsdeps_types::ReleaseAsset;

/// The subset of a release document the resolver reads
#[derive(Debug, Clone, Deserialize)]
pub struct LatestRelease {
    #[serde(default)]
    pub tarball_url: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
}

impl LatestRelease {
    /// Download URL of the requested asset
    ///
    /// # Errors
    ///
    /// Returns an error if the release has no tarball or if the number of
    /// assets matching the suffix is not exactly one.
    pub fn select(&self, repo: &str, asset: &ReleaseAsset) -> Result<String, ResolveError> {
        match asset {
            ReleaseAsset::Tarball => {
                self.tarball_url
                    .clone()
                    .ok_or_else(|| ResolveError::MissingTarball {
                        repo: repo.to_string(),
                    })
            }
            ReleaseAsset::Suffix(suffix) => {
                let matches: Vec<&Asset> = self
                    .assets
                    .iter()
                    .filter(|a| a.name.ends_with(suffix.as_str()))
                    .collect();
                match matches.as_slice() {
                    [only] => Ok(only.browser_download_url.clone()),
                    _ => Err(ResolveError::AmbiguousAsset {
                        repo: repo.to_string(),
                        suffix: suffix.clone(),
                        count: matches.len(),
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(names: &[&str]) -> LatestRelease {
        LatestRelease {
            tarball_url: None,
            assets: names
                .iter()
                .map(|name| Asset {
                    name: (*name).to_string(),
                    browser_download_url: format!("https://dl.test/{name}"),
                })
                .collect(),
        }
    }

    #[test]
    fn test_exactly_one_suffix_match() {
        let asset = ReleaseAsset::Suffix(".tar.gz".to_string());
        let url = release(&["xmlsec1-1.3.9.tar.gz", "xmlsec1-1.3.9.tar.gz.sig"])
            .select("lsh123/xmlsec", &asset)
            .unwrap();
        assert_eq!(url, "https://dl.test/xmlsec1-1.3.9.tar.gz");
    }

    #[test]
    fn test_zero_or_many_matches_fail() {
        let asset = ReleaseAsset::Suffix(".tar.gz".to_string());
        assert!(matches!(
            release(&[]).select("r", &asset),
            Err(ResolveError::AmbiguousAsset { count: 0, .. })
        ));
        assert!(matches!(
            release(&["a.tar.gz", "b.tar.gz"]).select("r", &asset),
            Err(ResolveError::AmbiguousAsset { count: 2, .. })
        ));
    }

    #[test]
    fn test_tarball_required() {
        assert!(matches!(
            release(&[]).select("openssl/openssl", &ReleaseAsset::Tarball),
            Err(ResolveError::MissingTarball { .. })
        ));
    }
}
