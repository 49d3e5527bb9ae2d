use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::FailureContext;
use xsdeps_errors::BuildStep;

/// Dependency build pipeline events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BuildEvent {
    /// Pipeline started with its fixed dependency order
    PipelineStarted {
        order: Vec<String>,
        prefix: PathBuf,
        jobs: usize,
    },

    /// Target architecture differs from the host
    CrossCompiling { arch: String, triplet: String },

    /// A deployment target was injected into the build environment
    DeploymentTargetSet { variable: String, value: String },

    /// Native dependency build started
    DependencyStarted { dependency: String },

    /// Native step started
    StepStarted {
        dependency: String,
        step: BuildStep,
        command: String,
        working_dir: PathBuf,
    },

    /// Native step completed successfully
    StepCompleted {
        dependency: String,
        step: BuildStep,
        duration: Duration,
    },

    /// Native step failed; the pipeline stops here
    StepFailed {
        dependency: String,
        step: BuildStep,
        failure: FailureContext,
    },

    /// Native dependency build completed
    DependencyCompleted {
        dependency: String,
        duration: Duration,
    },

    /// All dependencies built and installed
    PipelineCompleted { built: usize, duration: Duration },
}
