//! xsdeps - static dependency builds for the xmlsec Python extension
//!
//! The CLI merges configuration, drives the orchestrator crates and renders
//! their events through tracing.

mod cli;
mod error;
mod logging;
mod setup;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::error::CliError;
use crate::setup::Session;
use clap::Parser;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process;
use tokio::select;
use tracing::{error, info};
use xsdeps_builder::Pipeline;
use xsdeps_config::Config;
use xsdeps_events::EventReceiver;
use xsdeps_extension::{select as select_strategy, select_and_run, BundleSet, ExtensionConfig};
use xsdeps_resolver::ReleaseResolver;
use xsdeps_types::{DependencyKind, TargetOs};

/// What a command produced
enum Outcome {
    Configured {
        config: ExtensionConfig,
        output: Option<PathBuf>,
    },
    Resolved(String),
    Fetched(Vec<PathBuf>),
    Plan(String),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting xsdeps v{}", env!("CARGO_PKG_VERSION"));

    // 1. File config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Environment variables
    config.merge_env()?;

    // 3. CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global)?;

    let (event_sender, event_receiver) = xsdeps_events::channel();
    let session = Session::new(config, event_sender)?;

    let outcome = execute_command_with_events(cli.command, &session, event_receiver).await?;
    render(outcome).await?;

    info!("Command completed successfully");
    Ok(())
}

/// Apply CLI configuration overrides
fn apply_cli_config(config: &mut Config, global: &GlobalArgs) -> Result<(), CliError> {
    if global.static_deps {
        config.build.static_deps = true;
    }
    if let Some(arch) = &global.target_arch {
        config.build.target_arch = Some(arch.clone());
    }
    for pin in &global.pin {
        let (name, version) = pin
            .split_once('=')
            .filter(|(name, version)| !name.is_empty() && !version.is_empty())
            .ok_or_else(|| {
                CliError::InvalidArguments(format!("expected DEP=VERSION, got '{pin}'"))
            })?;
        config.pin(name, version)?;
    }
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    session: &Session,
    mut event_receiver: EventReceiver,
) -> Result<Outcome, CliError> {
    let mut command_future = Box::pin(execute_command(command, session));

    loop {
        select! {
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    logging::log_event_with_tracing(&event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    logging::log_event_with_tracing(&event);
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(command: Commands, session: &Session) -> Result<Outcome, CliError> {
    match command {
        Commands::Configure { output } => {
            let options = session.strategy_options();
            let mut ctx = session.strategy_context()?;
            let config = select_and_run(&session.platform, &options, &mut ctx).await?;
            Ok(Outcome::Configured { config, output })
        }

        Commands::Resolve { dependency } => {
            let kind: DependencyKind = dependency.parse().map_err(CliError::InvalidArguments)?;
            let channel = kind.release_channel(&session.config.endpoints);
            let url = ReleaseResolver::new(session.client.clone())
                .latest_url(kind, &channel, session.event_sender())
                .await?;
            Ok(Outcome::Resolved(url))
        }

        Commands::Fetch => {
            let cache = session.cache();
            let paths = if session.platform == TargetOs::Windows {
                BundleSet::detect().fetch(&cache).await?
            } else {
                let mut paths = Vec::new();
                for spec in session.config.dependency_specs() {
                    paths.push(cache.ensure_source(&spec).await?.archive);
                }
                paths
            };
            Ok(Outcome::Fetched(paths))
        }

        Commands::Plan => Ok(Outcome::Plan(describe_plan(session)?)),
    }
}

/// Human-readable description of what `configure` would do
fn describe_plan(session: &Session) -> Result<String, CliError> {
    let strategy = select_strategy(&session.platform, session.config.build.static_deps)
        .map_err(xsdeps_errors::Error::from)?;
    let env = session.build_environment()?;

    let mut out = String::new();
    let _ = writeln!(out, "platform:  {} ({})", session.platform, session.host.machine);
    let _ = writeln!(out, "strategy:  {strategy}");
    let _ = writeln!(out, "target:    {}", env.target_arch());
    match env.cross() {
        Some(cross) => {
            let _ = writeln!(out, "cross:     {}", cross.triplet());
        }
        None => {
            let _ = writeln!(out, "cross:     none");
        }
    }
    if let Some(target) = env.var("MACOSX_DEPLOYMENT_TARGET") {
        let _ = writeln!(out, "deploy:    MACOSX_DEPLOYMENT_TARGET={target}");
    }
    let _ = writeln!(out, "prefix:    {}", env.layout().prefix_dir.display());
    let _ = writeln!(out, "jobs:      {}", env.jobs());

    let _ = writeln!(out);
    for spec in session.config.dependency_specs() {
        let endpoints = &session.config.endpoints;
        let source = spec
            .pinned_url(endpoints)
            .unwrap_or_else(|| format!("latest via {}", spec.release_channel(endpoints)));
        let _ = writeln!(out, "{:<10} {source}", spec.name());
    }

    let _ = writeln!(out);
    for planned in Pipeline::plan(&env) {
        let _ = writeln!(out, "{}", planned.kind);
        for step in planned.steps {
            let _ = writeln!(out, "  {:<10} {}", step.step.to_string(), step.invocation);
        }
    }
    Ok(out)
}

/// Print or write the command's result
async fn render(outcome: Outcome) -> Result<(), CliError> {
    match outcome {
        Outcome::Configured { config, output } => {
            let json = serde_json::to_string_pretty(&config)?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, format!("{json}\n")).await?;
                    info!("Wrote extension settings to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Outcome::Resolved(url) => println!("{url}"),
        Outcome::Fetched(paths) => {
            for path in paths {
                println!("{}", path.display());
            }
        }
        Outcome::Plan(text) => print!("{text}"),
    }
    Ok(())
}
