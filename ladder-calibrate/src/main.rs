//! ladder-calibrate: calibration CLI for the lane-ladder model.
//!
//! Subcommands:
//! - init: write a fresh model (never overwrites)
//! - compute: solve the drift between two known values into a proposal
//! - patch: apply a proposal to the model (backup first, atomic write)
//! - verify: replay the model, run the configured bridge, or check one key
//! - full: init if needed, then compute, patch and verify in one session
//! - status: report on the model without touching it

mod commands;
mod config;
mod output;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{load_config, Config, LoggingSettings};

#[derive(Parser)]
#[command(name = "ladder-calibrate")]
#[command(about = "Calibrate and verify the lane-ladder model", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(short, long, global = true, default_value = "config/calibration.toml")]
    config: PathBuf,

    /// Raise log level (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the calibration model
    Init(commands::init::InitArgs),

    /// Solve drift between two known values
    Compute(commands::compute::ComputeArgs),

    /// Apply a drift proposal to the model
    Patch(commands::patch::PatchArgs),

    /// Check the model or a single key against known data
    Verify(commands::verify::VerifyArgs),

    /// Init, compute, patch and verify in one run
    Full(commands::full::FullArgs),

    /// Show the model without modifying it
    Status(commands::status::StatusArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // tracing comes up before a bad config can fail the run
    let loaded = load_config(&cli.config);
    init_tracing(&logging_settings(&cli, loaded.as_ref().ok()), cli.verbose)?;

    if !cli.config.exists() {
        tracing::warn!(config = %cli.config.display(), "config file not found, using defaults");
    }

    let result = loaded.and_then(|config| dispatch(&cli.command, &config));
    if let Err(e) = &result {
        let message = format!("{e:#}");
        tracing::error!(error = %message, "command failed");
    }
    result
}

fn dispatch(command: &Commands, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Init(args) => commands::init::run(args, config),
        Commands::Compute(args) => commands::compute::run(args, config),
        Commands::Patch(args) => commands::patch::run(args, config),
        Commands::Verify(args) => commands::verify::run(args, config),
        Commands::Full(args) => commands::full::run(args, config),
        Commands::Status(args) => commands::status::run(args, config),
    }
}

/// Configured logging, or defaults when the config did not load, with
/// `--log-file` applied on top.
fn logging_settings(cli: &Cli, config: Option<&Config>) -> LoggingSettings {
    let mut settings = config.map(|c| c.logging.clone()).unwrap_or_default();
    if let Some(path) = &cli.log_file {
        settings.file = Some(path.clone());
    }
    settings
}

/// `RUST_LOG` wins, then `-v`, then the configured level.
fn init_tracing(settings: &LoggingSettings, verbose: u8) -> anyhow::Result<()> {
    let level = match verbose {
        0 => settings.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = match &settings.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();
    Ok(())
}
