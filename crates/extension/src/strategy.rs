//! Platform strategy selection
//!
//! Windows always links the prebuilt bundles. Linux and macOS build the
//! dependencies from source when a static build is requested and otherwise
//! ask pkg-config for a system xmlsec1. Static builds are not supported
//! anywhere else.

use crate::descriptor::ExtensionConfig;
use crate::finalize::{finalize, xml_tree_include_dirs, FinalizeOptions, XmlTreeSource};
use crate::windows::BundleSet;
use crate::{dynamic, static_mode, windows};
use std::fmt;
use std::sync::Arc;
use xsdeps_builder::{ArchiveCache, BuildEnvironment, CommandRunner, Pipeline};
use xsdeps_errors::{BuildError, Error};
use xsdeps_events::{AppEvent, EventEmitter, EventSender, ExtensionEvent};
use xsdeps_types::{DependencySpec, TargetOs};

/// How the extension's dependencies are provided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    WindowsBundles,
    StaticSources,
    PkgConfig,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WindowsBundles => "windows-bundles",
            Self::StaticSources => "static-sources",
            Self::PkgConfig => "pkg-config",
        })
    }
}

/// Pick the strategy for `platform`
///
/// # Errors
///
/// Returns `UnsupportedPlatform` for a static build outside Windows, Linux
/// and macOS.
pub fn select(platform: &TargetOs, static_deps: bool) -> Result<Strategy, BuildError> {
    match platform {
        TargetOs::Windows => Ok(Strategy::WindowsBundles),
        TargetOs::Linux | TargetOs::MacOs if static_deps => Ok(Strategy::StaticSources),
        TargetOs::Other(name) if static_deps => Err(BuildError::UnsupportedPlatform {
            platform: name.clone(),
        }),
        _ => Ok(Strategy::PkgConfig),
    }
}

/// What to build
#[derive(Debug, Clone)]
pub struct StrategyOptions {
    pub static_deps: bool,
    /// Dependencies in build order
    pub specs: Vec<DependencySpec>,
    pub bundles: BundleSet,
    pub xml_tree: XmlTreeSource,
    pub finalize: FinalizeOptions,
}

/// Services a strategy runs with
pub struct StrategyContext {
    pub runner: Arc<dyn CommandRunner>,
    pub cache: ArchiveCache,
    pub env: BuildEnvironment,
    event_sender: Option<EventSender>,
}

impl EventEmitter for StrategyContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl StrategyContext {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, cache: ArchiveCache, env: BuildEnvironment) -> Self {
        Self {
            runner,
            cache,
            env,
            event_sender: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    fn pipeline(&self) -> Pipeline {
        let pipeline = Pipeline::new(Arc::clone(&self.runner));
        match &self.event_sender {
            Some(sender) => pipeline.with_event_sender(sender.clone()),
            None => pipeline,
        }
    }
}

/// Provide the dependencies for `platform` and produce the final settings
///
/// # Errors
///
/// Returns the first failure of the selected strategy, or of the lxml
/// include lookup.
pub async fn select_and_run(
    platform: &TargetOs,
    options: &StrategyOptions,
    ctx: &mut StrategyContext,
) -> Result<ExtensionConfig, Error> {
    let strategy = select(platform, options.static_deps)?;
    ctx.emit(AppEvent::Extension(ExtensionEvent::StrategySelected {
        platform: platform.to_string(),
        strategy: strategy.to_string(),
    }));

    let base = match strategy {
        Strategy::WindowsBundles => {
            let layout = ctx.env.layout().clone();
            layout.create_dirs().await?;
            options.bundles.fetch(&ctx.cache).await?;
            windows::unpack_cached(&ctx.cache, &layout.scratch_dir, &ctx.event_sender).await?;
            windows::configure(&layout.scratch_dir)?
        }
        Strategy::StaticSources => {
            ctx.env.layout().create_dirs().await?;
            let pipeline = ctx.pipeline();
            pipeline
                .build_from_sources(&ctx.cache, &options.specs, &mut ctx.env)
                .await?;
            static_mode::configure(&ctx.env.layout().prefix_dir, platform)?
        }
        Strategy::PkgConfig => dynamic::configure(ctx.runner.as_ref()).await?,
    };

    let xml_tree_dirs = xml_tree_include_dirs(&options.xml_tree, ctx.runner.as_ref()).await?;
    let finalize_options = FinalizeOptions {
        platform: platform.clone(),
        ..options.finalize.clone()
    };
    let config = finalize(base, &xml_tree_dirs, &finalize_options);

    ctx.emit(AppEvent::Extension(ExtensionEvent::Configured {
        macros: config.macros().len(),
        include_dirs: config.include_dirs().len(),
        static_objects: config.static_objects().len(),
    }));
    Ok(config)
}
