//! # cable
//!
//! Command-line front end for the cable liveness monitor: prints the
//! effective settings and runs an in-process connection simulation.

#![deny(unsafe_code)]

mod simulate;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cable_logging::LogFormat;
use cable_monitor::MonitorConfig;
use cable_settings::{CableSettings, LogOutput};

/// Connection liveness monitor.
#[derive(Parser, Debug)]
#[command(name = "cable", version, about = "Connection liveness monitor")]
struct Cli {
    /// Settings file (defaults to `~/.cable/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log filter, overriding the settings file (`RUST_LOG` still wins).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Print the effective settings as JSON.
    Settings,
    /// Run a monitor against a simulated server.
    Simulate(SimulateArgs),
}

#[derive(Args, Debug)]
struct SimulateArgs {
    /// Total run time in seconds.
    #[arg(long, default_value = "120")]
    duration_secs: u64,

    /// Server heartbeat period in milliseconds.
    #[arg(long, default_value = "3000")]
    heartbeat_ms: u64,

    /// Stop server heartbeats after this many seconds.
    #[arg(long)]
    silence_after_secs: Option<u64>,

    /// Send the app to the background after this many seconds.
    #[arg(long)]
    background_at_secs: Option<u64>,

    /// Bring the app back to the foreground after this many seconds.
    #[arg(long)]
    resume_at_secs: Option<u64>,
}

impl SimulateArgs {
    fn scenario(&self) -> Result<simulate::Scenario> {
        anyhow::ensure!(self.heartbeat_ms > 0, "--heartbeat-ms must be positive");
        Ok(simulate::Scenario {
            duration: Duration::from_secs(self.duration_secs),
            heartbeat: Duration::from_millis(self.heartbeat_ms),
            silence_after: self.silence_after_secs.map(Duration::from_secs),
            background_at: self.background_at_secs.map(Duration::from_secs),
            resume_at: self.resume_at_secs.map(Duration::from_secs),
        })
    }
}

fn load(path: Option<&Path>) -> Result<CableSettings> {
    match path {
        Some(path) => cable_settings::load_settings_from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => cable_settings::load_settings().context("Failed to load settings"),
    }
}

fn log_format(output: LogOutput) -> LogFormat {
    match output {
        LogOutput::Pretty => LogFormat::Pretty,
        LogOutput::Json => LogFormat::Json,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = load(cli.settings.as_deref())?;
    if cable_settings::init_settings(loaded).is_err() {
        warn!("global settings were already initialized");
    }
    let settings = cable_settings::get_settings();

    let level = cli.log_level.as_deref().unwrap_or(&settings.logging.level);
    cable_logging::init_with_format(level, log_format(settings.logging.format));

    match cli.command {
        CliCommand::Settings => {
            let json = serde_json::to_string_pretty(settings)
                .context("Failed to serialize settings")?;
            println!("{json}");
        }
        CliCommand::Simulate(args) => {
            let scenario = args.scenario()?;
            let config = MonitorConfig::from(&settings.monitor);
            info!(?scenario, ?config, "starting simulation");

            let shutdown = CancellationToken::new();
            let signal_token = shutdown.clone();
            drop(tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => signal_token.cancel(),
                    Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
                }
            }));

            let summary = simulate::run(&scenario, config, shutdown).await?;
            info!(
                heartbeats = summary.heartbeats,
                reopens = summary.reopens,
                reconnects = summary.reconnects,
                reconnect_attempts = summary.reconnect_attempts,
                "simulation summary"
            );
        }
    }
    Ok(())
}
