//! Dependency build pipeline
//!
//! Dependencies are built strictly one after another in
//! [`DependencyKind::BUILD_ORDER`]; each configure step finds the earlier
//! dependencies through the shared prefix. The first failing step stops the
//! run and later dependencies are not touched.

use crate::cache::{ArchiveCache, ResolvedSource};
use crate::environment::BuildEnvironment;
use crate::extract::extract;
use crate::recipes::{prepare_environment, recipe, RecipeStep};
use crate::runner::CommandRunner;
use globset::Glob;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use xsdeps_errors::{BuildError, Error};
use xsdeps_events::{
    AcquisitionEvent, AppEvent, BuildEvent, EventEmitter, EventSender, FailureContext,
};
use xsdeps_types::{DependencyKind, DependencySpec};

/// Planned work for one dependency
#[derive(Debug, Clone)]
pub struct PlannedDependency {
    pub kind: DependencyKind,
    pub steps: Vec<RecipeStep>,
}

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub built: Vec<DependencyKind>,
    pub prefix: PathBuf,
    pub duration: Duration,
}

/// Runs the native builds through a [`CommandRunner`]
#[derive(Clone)]
pub struct Pipeline {
    runner: Arc<dyn CommandRunner>,
    event_sender: Option<EventSender>,
}

impl EventEmitter for Pipeline {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl Pipeline {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            event_sender: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    /// Commands every dependency would run, without running them
    #[must_use]
    pub fn plan(env: &BuildEnvironment) -> Vec<PlannedDependency> {
        let mut env = env.clone();
        DependencyKind::BUILD_ORDER
            .iter()
            .map(|kind| {
                prepare_environment(*kind, &mut env);
                PlannedDependency {
                    kind: *kind,
                    steps: recipe(*kind, &env),
                }
            })
            .collect()
    }

    /// Fetch, unpack and build every dependency
    ///
    /// # Errors
    ///
    /// Returns the first acquisition, extraction or build failure.
    pub async fn build_from_sources(
        &self,
        cache: &ArchiveCache,
        specs: &[DependencySpec],
        env: &mut BuildEnvironment,
    ) -> Result<BuildSummary, Error> {
        let mut sources = Vec::with_capacity(specs.len());
        for spec in specs {
            sources.push(cache.ensure_source(spec).await?);
        }
        self.extract_all(&sources, &env.layout().scratch_dir).await?;
        self.run(env).await
    }

    /// Unpack every archive into the scratch directory
    ///
    /// # Errors
    ///
    /// Returns the first extraction failure.
    pub async fn extract_all(
        &self,
        sources: &[ResolvedSource],
        scratch_dir: &Path,
    ) -> Result<(), Error> {
        for source in sources {
            self.emit(AppEvent::Acquisition(AcquisitionEvent::ExtractStarted {
                archive: source.archive.clone(),
                destination: scratch_dir.to_path_buf(),
            }));
            extract(&source.archive, scratch_dir).await?;
            self.emit(AppEvent::Acquisition(AcquisitionEvent::ExtractCompleted {
                archive: source.archive.clone(),
            }));
        }
        Ok(())
    }

    /// Build and install every dependency in order
    ///
    /// # Errors
    ///
    /// Returns `SourceDirMissing` if an extracted tree is absent and
    /// `StepFailed` for the first step that cannot be spawned or exits
    /// unsuccessfully.
    pub async fn run(&self, env: &mut BuildEnvironment) -> Result<BuildSummary, Error> {
        let started = Instant::now();
        self.emit(AppEvent::Build(BuildEvent::PipelineStarted {
            order: DependencyKind::BUILD_ORDER
                .iter()
                .map(|k| k.name().to_string())
                .collect(),
            prefix: env.layout().prefix_dir.clone(),
            jobs: env.jobs(),
        }));
        if let Some(cross) = env.cross() {
            self.emit(AppEvent::Build(BuildEvent::CrossCompiling {
                arch: cross.arch.clone(),
                triplet: cross.triplet(),
            }));
        }
        if let Some(target) = env.var("MACOSX_DEPLOYMENT_TARGET") {
            self.emit(AppEvent::Build(BuildEvent::DeploymentTargetSet {
                variable: "MACOSX_DEPLOYMENT_TARGET".to_string(),
                value: target.to_string(),
            }));
        }

        let mut built = Vec::new();
        for kind in DependencyKind::BUILD_ORDER {
            self.build_one(kind, env).await?;
            built.push(kind);
        }

        let duration = started.elapsed();
        self.emit(AppEvent::Build(BuildEvent::PipelineCompleted {
            built: built.len(),
            duration,
        }));
        Ok(BuildSummary {
            built,
            prefix: env.layout().prefix_dir.clone(),
            duration,
        })
    }

    async fn build_one(
        &self,
        kind: DependencyKind,
        env: &mut BuildEnvironment,
    ) -> Result<(), Error> {
        let started = Instant::now();
        self.emit(AppEvent::Build(BuildEvent::DependencyStarted {
            dependency: kind.name().to_string(),
        }));

        let source_dir = locate_source(&env.layout().scratch_dir, kind).await?;
        prepare_environment(kind, env);

        for RecipeStep { step, invocation } in recipe(kind, env) {
            let invocation = invocation.current_dir(&source_dir).envs(env.vars());
            let step_started = Instant::now();
            self.emit(AppEvent::Build(BuildEvent::StepStarted {
                dependency: kind.name().to_string(),
                step,
                command: invocation.to_string(),
                working_dir: source_dir.clone(),
            }));

            let status = match self.runner.run(&invocation).await {
                Ok(report) if report.success() => None,
                Ok(report) => Some(report.to_string()),
                Err(err) => Some(err.to_string()),
            };

            if let Some(status) = status {
                let error = BuildError::StepFailed {
                    dependency: kind.name().to_string(),
                    step,
                    status,
                };
                self.emit(AppEvent::Build(BuildEvent::StepFailed {
                    dependency: kind.name().to_string(),
                    step,
                    failure: FailureContext::from_error(&error),
                }));
                return Err(error.into());
            }

            self.emit(AppEvent::Build(BuildEvent::StepCompleted {
                dependency: kind.name().to_string(),
                step,
                duration: step_started.elapsed(),
            }));
        }

        self.emit(AppEvent::Build(BuildEvent::DependencyCompleted {
            dependency: kind.name().to_string(),
            duration: started.elapsed(),
        }));
        Ok(())
    }
}

/// The extracted source tree of `kind` inside `scratch_dir`
///
/// # Errors
///
/// Returns `BuildError::SourceDirMissing` if no directory matches.
pub async fn locate_source(scratch_dir: &Path, kind: DependencyKind) -> Result<PathBuf, Error> {
    let pattern = kind.source_dir_glob();
    let missing = || BuildError::SourceDirMissing {
        pattern: pattern.to_string(),
        path: scratch_dir.display().to_string(),
    };

    let matcher = Glob::new(pattern)
        .map_err(|e| BuildError::InvalidGlob {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?
        .compile_matcher();

    let mut entries = tokio::fs::read_dir(scratch_dir)
        .await
        .map_err(|_| missing())?;
    let mut found = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        if !matcher.is_match(entry.file_name()) {
            continue;
        }
        let path = entry.path();
        if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            found.push(path);
        }
    }
    found.sort();

    found.into_iter().next().ok_or_else(|| missing().into())
}
