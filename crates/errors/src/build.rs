//! Build pipeline error types

use std::borrow::Cow;
use std::fmt;

use crate::UserFacingError;
use thiserror::Error;

/// Native build step that can fail for a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BuildStep {
    Configure,
    Build,
    Install,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configure => write!(f, "configure"),
            Self::Build => write!(f, "build"),
            Self::Install => write!(f, "install"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum BuildError {
    #[error("fetch failed for {dependency} from {url}: {message}")]
    FetchFailed {
        dependency: String,
        url: String,
        message: String,
    },

    #[error("bad {file} downloaded; remove it and try again")]
    CorruptArchive { file: String, message: String },

    #[error("extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("unsupported archive format: {format}")]
    UnsupportedArchiveFormat { format: String },

    #[error("no extracted source directory matching {pattern} in {path}")]
    SourceDirMissing { pattern: String, path: String },

    #[error("{dependency} {step} step failed: {status}")]
    StepFailed {
        dependency: String,
        step: BuildStep,
        status: String,
    },

    #[error("unsupported static build platform: {platform}")]
    UnsupportedPlatform { platform: String },

    #[error("invalid glob pattern {pattern}: {message}")]
    InvalidGlob { pattern: String, message: String },
}

impl UserFacingError for BuildError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::CorruptArchive { .. } => {
                Some("Delete the named archive from the cache directory and rerun the build.")
            }
            Self::FetchFailed { .. } => {
                Some("Check network access or place the source archive in the cache directory.")
            }
            Self::SourceDirMissing { .. } => {
                Some("The cached archive does not unpack to the expected directory; delete it and retry.")
            }
            Self::StepFailed { .. } => {
                Some("Inspect the native build output above; partial results are left in the build directory.")
            }
            Self::UnsupportedPlatform { .. } => {
                Some("Static builds are supported on Linux, macOS and Windows only.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::FetchFailed { .. } | Self::CorruptArchive { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::FetchFailed { .. } => "build.fetch_failed",
            Self::CorruptArchive { .. } => "build.corrupt_archive",
            Self::ExtractionFailed { .. } => "build.extraction_failed",
            Self::UnsupportedArchiveFormat { .. } => "build.unsupported_archive_format",
            Self::SourceDirMissing { .. } => "build.source_dir_missing",
            Self::StepFailed { .. } => "build.step_failed",
            Self::UnsupportedPlatform { .. } => "build.unsupported_platform",
            Self::InvalidGlob { .. } => "build.invalid_glob",
        };
        Some(code)
    }
}
