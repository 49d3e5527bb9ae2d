#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]
//! Static dependency builds for xsdeps
//!
//! This crate fetches the source archives of the six native dependencies,
//! unpacks them and drives their autoconf/make builds into one shared
//! installation prefix.

pub mod cache;
pub mod cross;
pub mod environment;
pub mod extract;
pub mod pipeline;
pub mod recipes;
pub mod runner;

pub use cache::{ArchiveCache, ResolvedSource};
pub use cross::{plan as plan_cross, CrossPlan, HostInfo};
pub use environment::{BuildEnvironment, BuildLayout};
pub use extract::{extract, ArchiveFormat};
pub use pipeline::{locate_source, BuildSummary, Pipeline, PlannedDependency};
pub use recipes::{prepare_environment, recipe, RecipeStep};
pub use runner::{
    CapturedOutput, CommandRunner, ExitReport, Invocation, ProcessRunner, RecordingRunner,
};
