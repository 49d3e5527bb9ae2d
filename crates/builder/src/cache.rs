//! Flat directory of downloaded source archives
//!
//! Any file matching a dependency's glob satisfies that dependency; nothing
//! is version-checked and nothing is ever deleted, so operators can pre-seed
//! the directory for offline builds.

use globset::Glob;
use std::path::{Path, PathBuf};
use xsdeps_errors::{BuildError, Error};
use xsdeps_events::{AcquisitionEvent, AppEvent, EventEmitter, EventSender, UrlOrigin};
use xsdeps_net::{download_file, NetClient};
use xsdeps_resolver::ReleaseResolver;
use xsdeps_types::{DependencyKind, DependencySpec, Endpoints};

/// A dependency bound to an archive on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub kind: DependencyKind,
    pub archive: PathBuf,
    /// Whether this run downloaded the archive
    pub downloaded: bool,
}

/// Archive cache backed by the network
#[derive(Clone)]
pub struct ArchiveCache {
    dir: PathBuf,
    client: NetClient,
    resolver: ReleaseResolver,
    endpoints: Endpoints,
    event_sender: Option<EventSender>,
}

impl EventEmitter for ArchiveCache {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl ArchiveCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, client: NetClient, endpoints: Endpoints) -> Self {
        Self {
            dir: dir.into(),
            resolver: ReleaseResolver::new(client.clone()),
            client,
            endpoints,
            event_sender: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    #[must_use]
    pub fn resolver(&self) -> &ReleaseResolver {
        &self.resolver
    }

    /// Every file directly in the cache whose name matches `pattern`, sorted
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid or the directory cannot be
    /// read. A missing directory yields no matches.
    pub async fn matching(&self, pattern: &str) -> Result<Vec<PathBuf>, Error> {
        let matcher = Glob::new(pattern)
            .map_err(|e| BuildError::InvalidGlob {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?
            .compile_matcher();

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io_with_path(&e, &self.dir)),
        };

        let mut found = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::io_with_path(&e, &self.dir))?
        {
            if !matcher.is_match(entry.file_name()) {
                continue;
            }
            let path = entry.path();
            // Follows symlinks, so a linked archive counts as cached
            if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
                found.push(path);
            }
        }
        found.sort();
        Ok(found)
    }

    /// First cached archive matching `pattern`
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid or the directory cannot be read.
    pub async fn find_cached(&self, pattern: &str) -> Result<Option<PathBuf>, Error> {
        Ok(self.matching(pattern).await?.into_iter().next())
    }

    /// Make sure an archive for `spec` is present, downloading it if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the latest release cannot be resolved or the
    /// download fails.
    pub async fn ensure_source(&self, spec: &DependencySpec) -> Result<ResolvedSource, Error> {
        if let Some(archive) = self.find_cached(spec.glob()).await? {
            self.emit(AppEvent::Acquisition(AcquisitionEvent::CacheHit {
                dependency: spec.name().to_string(),
                path: archive.clone(),
            }));
            return Ok(ResolvedSource {
                kind: spec.kind,
                archive,
                downloaded: false,
            });
        }

        let (url, origin) = match spec.pinned_url(&self.endpoints) {
            Some(url) => (
                url,
                UrlOrigin::Pinned {
                    label: spec.kind.version_env().to_string(),
                    version: spec.pinned_version.clone().unwrap_or_default(),
                },
            ),
            None => {
                let channel = spec.release_channel(&self.endpoints);
                let url = self
                    .resolver
                    .latest_url(spec.kind, &channel, &self.event_sender)
                    .await?;
                (
                    url,
                    UrlOrigin::Latest {
                        label: spec.kind.version_env().to_string(),
                    },
                )
            }
        };

        let archive = self
            .download(spec.name(), &url, spec.filename(), origin)
            .await?;
        Ok(ResolvedSource {
            kind: spec.kind,
            archive,
            downloaded: true,
        })
    }

    /// Make sure `filename` is present, downloading it from `url` otherwise
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails.
    pub async fn ensure_file(
        &self,
        dependency: &str,
        filename: &str,
        url: &str,
    ) -> Result<PathBuf, Error> {
        let path = self.dir.join(filename);
        if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
            self.emit(AppEvent::Acquisition(AcquisitionEvent::CacheHit {
                dependency: dependency.to_string(),
                path: path.clone(),
            }));
            return Ok(path);
        }
        self.download(dependency, url, filename, UrlOrigin::Bundle)
            .await
    }

    async fn download(
        &self,
        dependency: &str,
        url: &str,
        filename: &str,
        origin: UrlOrigin,
    ) -> Result<PathBuf, Error> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::io_with_path(&e, &self.dir))?;
        let dest = self.dir.join(filename);

        self.emit(AppEvent::Acquisition(AcquisitionEvent::DownloadStarted {
            dependency: dependency.to_string(),
            url: url.to_string(),
            origin,
        }));

        let bytes = download_file(&self.client, url, &dest, &self.event_sender)
            .await
            .map_err(|e| match e {
                Error::Network(net) => BuildError::FetchFailed {
                    dependency: dependency.to_string(),
                    url: url.to_string(),
                    message: net.to_string(),
                }
                .into(),
                other => other,
            })?;

        self.emit(AppEvent::Acquisition(AcquisitionEvent::DownloadCompleted {
            dependency: dependency.to_string(),
            path: dest.clone(),
            bytes,
        }));
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(dir: &Path) -> ArchiveCache {
        ArchiveCache::new(
            dir,
            NetClient::with_defaults().unwrap(),
            Endpoints::with_base("http://127.0.0.1:9"),
        )
    }

    #[tokio::test]
    async fn test_glob_matches_prefixed_archives_only() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("zlib-1.3.1.tar.gz"), b"x").unwrap();
        std::fs::write(temp.path().join("zlib.tar.xz"), b"x").unwrap();
        std::fs::write(temp.path().join("openssl.tar.gz"), b"x").unwrap();

        let cache = cache(temp.path());
        assert_eq!(
            cache.find_cached("zlib*.tar.gz").await.unwrap(),
            Some(temp.path().join("zlib-1.3.1.tar.gz"))
        );
        assert_eq!(cache.find_cached("libxml2*.tar.xz").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_directory_has_no_matches() {
        let temp = tempfile::tempdir().unwrap();
        let cache = cache(&temp.path().join("absent"));
        assert!(cache.matching("*.zip").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preseeded_archive_needs_no_network() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("xmlsec1-1.3.9.tar.gz"), b"x").unwrap();

        let cache = cache(temp.path());
        let spec = DependencySpec::new(DependencyKind::Xmlsec1, None);
        let source = cache.ensure_source(&spec).await.unwrap();
        assert!(!source.downloaded);
        assert_eq!(source.archive, temp.path().join("xmlsec1-1.3.9.tar.gz"));
    }
}
