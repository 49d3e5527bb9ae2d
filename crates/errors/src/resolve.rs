//! Release resolution error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ResolveError {
    #[error("could not determine latest {dependency} release: {message}")]
    LatestUnavailable { dependency: String, message: String },

    #[error("no release links found in index {url}")]
    EmptyIndex { url: String },

    #[error("source manifest {url} is missing {missing}")]
    MalformedManifest { url: String, missing: String },

    #[error("release {repo} has no tarball URL")]
    MissingTarball { repo: String },

    #[error("release {repo} has {count} assets ending in {suffix}, expected exactly one")]
    AmbiguousAsset {
        repo: String,
        suffix: String,
        count: usize,
    },

    #[error("invalid version pattern {pattern}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl UserFacingError for ResolveError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        Some("Pin the dependency version in the environment (XSDEPS_<NAME>_VERSION) to skip release discovery.")
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::LatestUnavailable { .. } => "resolve.latest_unavailable",
            Self::EmptyIndex { .. } => "resolve.empty_index",
            Self::MalformedManifest { .. } => "resolve.malformed_manifest",
            Self::MissingTarball { .. } => "resolve.missing_tarball",
            Self::AmbiguousAsset { .. } => "resolve.ambiguous_asset",
            Self::InvalidPattern { .. } => "resolve.invalid_pattern",
        };
        Some(code)
    }
}
