//! CLI entrypoint for gavel
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod replay;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use gavel_application::{AuditSink, GovernanceContext, NoAuditSink};
use gavel_infrastructure::{
    BroadcastEventBus, ConfigLoader, FileConfig, InMemoryGovernanceStore, JsonlAuditSink,
    ScenarioLoader,
};
use gavel_presentation::{Cli, ConsoleFormatter, OutputConfig, ReportFormatter};
use replay::ScenarioReplay;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };

    // Keep the guard alive so buffered log lines reach the file
    let _log_guard = init_logging(cli.log_level(), config.logging.file.as_deref())?;

    check_config(&config)?;

    let output = OutputConfig::resolve(
        cli.output.map(Into::into),
        config.output.format,
        config.output.color,
    );
    if !output.color {
        colored::control::set_override(false);
    }

    let Some(path) = cli.scenario.as_ref() else {
        bail!("A scenario file is required");
    };
    let scenario = ScenarioLoader::load(path)
        .with_context(|| format!("Failed to load scenario {}", path.display()))?;

    // === Dependency Injection ===
    let store = Arc::new(
        InMemoryGovernanceStore::new().with_lock_timeout(config.engine.lock_timeout()),
    );
    let audit: Arc<dyn AuditSink> = match config.audit.path.as_deref() {
        Some(path) => match JsonlAuditSink::new(path) {
            Some(sink) => {
                info!("Audit trail: {}", sink.path().display());
                Arc::new(sink)
            }
            None => Arc::new(NoAuditSink),
        },
        None => Arc::new(NoAuditSink),
    };
    let bus = Arc::new(BroadcastEventBus::new(config.events.capacity));
    let mut events = bus.subscribe();
    let listener = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => debug!("Event {}: {:?}", event.name(), event),
                Err(RecvError::Lagged(missed)) => warn!("Event listener missed {} events", missed),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let ctx = GovernanceContext::new(store)
        .with_audit(audit)
        .with_events(bus)
        .with_config(config.engine.to_engine_config());

    info!("Replaying {}", path.display());
    let outcome = ScenarioReplay::new(ctx)
        .validating(cli.validate)
        .run(&scenario)
        .await
        .context("Replay aborted")?;

    // Every sender is gone once the replay is dropped
    listener.await.context("Event listener failed")?;
    debug!("Report for {}", outcome.meeting);

    if !cli.quiet {
        for failure in &outcome.failures {
            eprintln!(
                "{} {}: {}",
                "refused".yellow().bold(),
                failure.step,
                failure.error.justification()
            );
        }
    }

    println!("{}", ConsoleFormatter.render(&outcome.report, output.format));

    Ok(())
}

/// Print configuration issues; errors abort
fn check_config(config: &FileConfig) -> Result<()> {
    let issues = config.validate();
    for issue in &issues {
        if issue.is_error() {
            eprintln!("{} {}", "config error:".red().bold(), issue);
        } else {
            warn!("{}", issue);
        }
    }
    if issues.iter().any(|issue| issue.is_error()) {
        bail!("Invalid configuration");
    }
    Ok(())
}

/// Console logging on stderr, plus a plain-text file when `[logging] file` is set
///
/// `RUST_LOG` overrides the level derived from `-v`/`-q`.
fn init_logging(level: &str, file: Option<&str>) -> Result<Option<WorkerGuard>> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter());

    let (file_layer, guard) = match file {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Log file {} has no file name", file))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}
