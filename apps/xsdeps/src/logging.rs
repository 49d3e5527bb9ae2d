//! Structured logging integration for events
//!
//! Library crates only emit [`AppEvent`]s; this module turns them into
//! tracing records with structured fields.

use tracing::{debug, error, info, warn};
use xsdeps_events::{
    AcquisitionEvent, AppEvent, BuildEvent, ExtensionEvent, GeneralEvent, UrlOrigin,
};

/// Install the global subscriber
///
/// `RUST_LOG` wins; `--debug` raises the xsdeps crates to debug level.
pub fn init_tracing(debug_enabled: bool) {
    let default_filter = if debug_enabled {
        "info,xsdeps=debug"
    } else {
        "warn,xsdeps=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(debug_enabled)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}

/// Log an `AppEvent` through tracing
pub fn log_event_with_tracing(event: &AppEvent) {
    let source = event.event_source();
    match event {
        AppEvent::General(general) => match general {
            GeneralEvent::Warning { message, context } => {
                warn!(source = source.as_str(), context = ?context, "{message}");
            }
            GeneralEvent::Error { message, details } => {
                error!(source = source.as_str(), details = ?details, "{message}");
            }
            GeneralEvent::DebugLog { message, context } => {
                debug!(source = source.as_str(), context = ?context, "{message}");
            }
            GeneralEvent::OperationStarted { operation } => {
                info!(source = source.as_str(), operation = %operation, "Operation started");
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                info!(
                    source = source.as_str(),
                    operation = %operation,
                    success = success,
                    "Operation completed"
                );
            }
        },

        AppEvent::Acquisition(acquisition) => match acquisition {
            AcquisitionEvent::CacheHit { dependency, path } => {
                info!(
                    source = source.as_str(),
                    dependency = %dependency,
                    path = %path.display(),
                    "Using cached archive"
                );
            }
            AcquisitionEvent::ResolveStarted {
                dependency,
                channel,
            } => {
                info!(
                    source = source.as_str(),
                    dependency = %dependency,
                    channel = %channel,
                    "Resolving latest release"
                );
            }
            AcquisitionEvent::Resolved { dependency, url } => {
                info!(source = source.as_str(), dependency = %dependency, url = %url, "Resolved");
            }
            AcquisitionEvent::AuthenticatedRequest { url } => {
                debug!(source = source.as_str(), url = %url, "Using bearer token");
            }
            AcquisitionEvent::DownloadStarted {
                dependency,
                url,
                origin,
            } => match origin {
                UrlOrigin::Pinned { label, version } => info!(
                    source = source.as_str(),
                    dependency = %dependency,
                    url = %url,
                    "{label}={version}, downloading"
                ),
                UrlOrigin::Latest { label } => info!(
                    source = source.as_str(),
                    dependency = %dependency,
                    url = %url,
                    "{label} unset, downloading latest"
                ),
                UrlOrigin::Bundle => info!(
                    source = source.as_str(),
                    dependency = %dependency,
                    url = %url,
                    "Downloading prebuilt bundle"
                ),
            },
            AcquisitionEvent::DownloadCompleted {
                dependency,
                path,
                bytes,
            } => {
                info!(
                    source = source.as_str(),
                    dependency = %dependency,
                    path = %path.display(),
                    bytes = bytes,
                    "Download completed"
                );
            }
            AcquisitionEvent::ExtractStarted {
                archive,
                destination,
            } => {
                info!(
                    source = source.as_str(),
                    archive = %archive.display(),
                    destination = %destination.display(),
                    "Unpacking"
                );
            }
            AcquisitionEvent::ExtractCompleted { archive } => {
                debug!(source = source.as_str(), archive = %archive.display(), "Unpacked");
            }
        },

        AppEvent::Build(build) => match build {
            BuildEvent::PipelineStarted {
                order,
                prefix,
                jobs,
            } => {
                info!(
                    source = source.as_str(),
                    order = %order.join(" -> "),
                    prefix = %prefix.display(),
                    jobs = jobs,
                    "Starting static build"
                );
            }
            BuildEvent::CrossCompiling { arch, triplet } => {
                info!(
                    source = source.as_str(),
                    arch = %arch,
                    triplet = %triplet,
                    "Cross-compiling"
                );
            }
            BuildEvent::DeploymentTargetSet { variable, value } => {
                info!(source = source.as_str(), "{variable}={value}");
            }
            BuildEvent::DependencyStarted { dependency } => {
                info!(source = source.as_str(), dependency = %dependency, "Building {dependency}");
            }
            BuildEvent::StepStarted {
                dependency,
                step,
                command,
                working_dir,
            } => {
                debug!(
                    source = source.as_str(),
                    dependency = %dependency,
                    step = %step,
                    working_dir = %working_dir.display(),
                    "{command}"
                );
            }
            BuildEvent::StepCompleted {
                dependency,
                step,
                duration,
            } => {
                debug!(
                    source = source.as_str(),
                    dependency = %dependency,
                    step = %step,
                    duration = ?duration,
                    "Step completed"
                );
            }
            BuildEvent::StepFailed {
                dependency,
                step,
                failure,
            } => {
                error!(
                    source = source.as_str(),
                    dependency = %dependency,
                    step = %step,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Build step failed"
                );
            }
            BuildEvent::DependencyCompleted {
                dependency,
                duration,
            } => {
                info!(
                    source = source.as_str(),
                    dependency = %dependency,
                    duration_secs = duration.as_secs(),
                    "Built {dependency}"
                );
            }
            BuildEvent::PipelineCompleted { built, duration } => {
                info!(
                    source = source.as_str(),
                    built = built,
                    duration_secs = duration.as_secs(),
                    "Static build completed"
                );
            }
        },

        AppEvent::Extension(extension) => match extension {
            ExtensionEvent::StrategySelected { platform, strategy } => {
                info!(
                    source = source.as_str(),
                    platform = %platform,
                    strategy = %strategy,
                    "Configuring extension"
                );
            }
            ExtensionEvent::Configured {
                macros,
                include_dirs,
                static_objects,
            } => {
                info!(
                    source = source.as_str(),
                    macros = macros,
                    include_dirs = include_dirs,
                    static_objects = static_objects,
                    "Extension configured"
                );
            }
        },
    }
}
