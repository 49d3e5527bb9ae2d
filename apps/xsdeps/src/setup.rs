//! Wiring configuration into the orchestrator services

use std::sync::Arc;
use std::time::Duration;
use xsdeps_builder::{
    plan_cross, ArchiveCache, BuildEnvironment, BuildLayout, CommandRunner, CrossPlan, HostInfo,
    ProcessRunner,
};
use xsdeps_config::{calculate_build_jobs, Config};
use xsdeps_errors::Error;
use xsdeps_events::EventSender;
use xsdeps_extension::{BundleSet, FinalizeOptions, StrategyContext, StrategyOptions, XmlTreeSource};
use xsdeps_net::{NetClient, NetConfig};
use xsdeps_types::TargetOs;

/// Everything one command needs, built once from the merged configuration
pub struct Session {
    pub config: Config,
    pub platform: TargetOs,
    pub host: HostInfo,
    pub target_arch: String,
    pub client: NetClient,
    pub runner: Arc<dyn CommandRunner>,
    event_sender: EventSender,
}

impl Session {
    /// Build the session for the running host
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: Config, event_sender: EventSender) -> Result<Self, Error> {
        let host = HostInfo::detect();
        let target_arch = config
            .build
            .target_arch
            .clone()
            .unwrap_or_else(|| host.machine.clone());

        let client = NetClient::new(NetConfig {
            timeout: Duration::from_secs(config.network.timeout),
            bearer_token: config.network.github_token.clone(),
            ..NetConfig::default()
        })?;

        Ok(Self {
            platform: host.os.clone(),
            host,
            target_arch,
            client,
            runner: Arc::new(ProcessRunner),
            config,
            event_sender,
        })
    }

    #[must_use]
    pub fn event_sender(&self) -> &EventSender {
        &self.event_sender
    }

    #[must_use]
    pub fn cache(&self) -> ArchiveCache {
        ArchiveCache::new(
            self.config.libs_dir(),
            self.client.clone(),
            self.config.endpoints.clone(),
        )
        .with_event_sender(self.event_sender.clone())
    }

    #[must_use]
    pub fn cross_plan(&self, inherited: &std::collections::BTreeMap<String, String>) -> CrossPlan {
        plan_cross(&self.host, &self.platform, &self.target_arch, inherited)
    }

    /// Build environment seeded from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix path cannot be made absolute.
    pub fn build_environment(&self) -> Result<BuildEnvironment, Error> {
        let layout = BuildLayout::new(&self.config.build_root(), &self.config.libs_dir())?;
        let inherited = BuildEnvironment::process_env();
        let plan = self.cross_plan(&inherited);
        Ok(BuildEnvironment::new(
            layout,
            inherited,
            plan,
            self.target_arch.clone(),
            calculate_build_jobs(self.config.build.build_jobs),
        ))
    }

    /// Inputs of the extension configurator
    #[must_use]
    pub fn strategy_options(&self) -> StrategyOptions {
        let settings = &self.config.extension;
        StrategyOptions {
            static_deps: self.config.build.static_deps,
            specs: self.config.dependency_specs(),
            bundles: BundleSet::detect(),
            xml_tree: XmlTreeSource {
                include_dirs: settings.xml_tree_include_dirs.clone(),
                python: settings.python.clone(),
            },
            finalize: FinalizeOptions {
                platform: self.platform.clone(),
                module_name: settings.module_name.clone(),
                module_version: settings.module_version.clone(),
                debug: self.config.build.enable_debug,
                optimize_size: self.config.build.optimize_size,
            },
        }
    }

    /// Services for the extension configurator
    ///
    /// # Errors
    ///
    /// Returns an error if the build environment cannot be prepared.
    pub fn strategy_context(&self) -> Result<StrategyContext, Error> {
        Ok(StrategyContext::new(
            Arc::clone(&self.runner),
            self.cache(),
            self.build_environment()?,
        )
        .with_event_sender(self.event_sender.clone()))
    }
}
