//! Latest-release discovery over the three release channels

use crate::html::{collect_hrefs, compile_pattern, select_latest};
use crate::manifest::latest_tar_xz;
use crate::release_api::LatestRelease;
use serde_json::Value;
use xsdeps_errors::{Error, ResolveError};
use xsdeps_events::{AcquisitionEvent, AppEvent, EventEmitter};
use xsdeps_net::{fetch_json, fetch_text, NetClient};
use xsdeps_types::{join_url, DependencyKind, ReleaseAsset, ReleaseChannel};

/// Release resolver
#[derive(Clone)]
pub struct ReleaseResolver {
    client: NetClient,
}

impl ReleaseResolver {
    /// Create new resolver on top of a network client
    #[must_use]
    pub fn new(client: NetClient) -> Self {
        Self { client }
    }

    /// Latest download URL of `kind` through its own release channel
    ///
    /// # Errors
    ///
    /// Network and decoding failures become `ResolveError::LatestUnavailable`
    /// naming the dependency; channel-specific failures keep their own variant.
    pub async fn latest_url(
        &self,
        kind: DependencyKind,
        channel: &ReleaseChannel,
        tx: &impl EventEmitter,
    ) -> Result<String, Error> {
        tx.emit(AppEvent::Acquisition(AcquisitionEvent::ResolveStarted {
            dependency: kind.name().to_string(),
            channel: channel.to_string(),
        }));

        let url = self
            .resolve_channel(channel, tx)
            .await
            .map_err(|err| match err {
                Error::Resolve(_) => err,
                other => ResolveError::LatestUnavailable {
                    dependency: kind.name().to_string(),
                    message: other.to_string(),
                }
                .into(),
            })?;

        tx.emit(AppEvent::Acquisition(AcquisitionEvent::Resolved {
            dependency: kind.name().to_string(),
            url: url.clone(),
        }));
        Ok(url)
    }

    async fn resolve_channel(
        &self,
        channel: &ReleaseChannel,
        tx: &impl EventEmitter,
    ) -> Result<String, Error> {
        match channel {
            ReleaseChannel::HtmlIndex { base_url, pattern } => {
                self.latest_from_index(base_url, pattern, tx).await
            }
            ReleaseChannel::JsonManifest { base_url, project } => {
                self.latest_from_manifest(base_url, project, tx).await
            }
            ReleaseChannel::ReleaseApi {
                api_base,
                repo,
                asset,
            } => self.latest_from_release_api(api_base, repo, asset, tx).await,
        }
    }

    async fn latest_from_index(
        &self,
        base_url: &str,
        pattern: &str,
        tx: &impl EventEmitter,
    ) -> Result<String, Error> {
        let pattern = compile_pattern(pattern)?;
        let listing = fetch_text(&self.client, base_url, tx).await?;
        let hrefs = collect_hrefs(&listing)?;

        let latest = select_latest(&pattern, &hrefs).ok_or_else(|| ResolveError::EmptyIndex {
            url: base_url.to_string(),
        })?;
        Ok(join_url(base_url, latest))
    }

    async fn latest_from_manifest(
        &self,
        base_url: &str,
        project: &str,
        tx: &impl EventEmitter,
    ) -> Result<String, Error> {
        let cache_url = join_url(base_url, "cache.json");
        let manifest: Value = fetch_json(&self.client, &cache_url, false, tx).await?;
        let source = latest_tar_xz(&manifest, project, &cache_url)?;
        Ok(join_url(base_url, &source))
    }

    async fn latest_from_release_api(
        &self,
        api_base: &str,
        repo: &str,
        asset: &ReleaseAsset,
        tx: &impl EventEmitter,
    ) -> Result<String, Error> {
        let api_url = join_url(api_base, &format!("repos/{repo}/releases/latest"));
        if self.client.has_token() {
            tx.emit(AppEvent::Acquisition(
                AcquisitionEvent::AuthenticatedRequest {
                    url: api_url.clone(),
                },
            ));
        }

        let release: LatestRelease = fetch_json(&self.client, &api_url, true, tx).await?;
        Ok(release.select(repo, asset)?)
    }
}
