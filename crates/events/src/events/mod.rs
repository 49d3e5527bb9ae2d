use serde::{Deserialize, Serialize};

use crate::{EventLevel, EventSource};
use xsdeps_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self {
            code: error.user_code().map(Into::into),
            message: error.user_message().into_owned(),
            hint: error.user_hint().map(Into::into),
            retryable: error.is_retryable(),
        }
    }
}

pub mod acquisition;
pub mod build;
pub mod extension;
pub mod general;

pub use acquisition::*;
pub use build::*;
pub use extension::*;
pub use general::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, debug output)
    General(GeneralEvent),

    /// Source acquisition: cache lookups, release resolution, downloads, extraction
    Acquisition(AcquisitionEvent),

    /// Native dependency build pipeline
    Build(BuildEvent),

    /// Extension configuration
    Extension(ExtensionEvent),
}

impl AppEvent {
    /// Identify the source domain for this event.
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Acquisition(_) => EventSource::ACQUISITION,
            Self::Build(_) => EventSource::BUILD,
            Self::Extension(_) => EventSource::EXTENSION,
        }
    }

    /// Severity used when the event is rendered through tracing.
    #[must_use]
    pub fn level(&self) -> EventLevel {
        match self {
            Self::General(GeneralEvent::Warning { .. }) => EventLevel::Warn,
            Self::General(GeneralEvent::Error { .. })
            | Self::Build(BuildEvent::StepFailed { .. }) => EventLevel::Error,
            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Acquisition(AcquisitionEvent::AuthenticatedRequest { .. }) => {
                EventLevel::Debug
            }
            _ => EventLevel::Info,
        }
    }
}
