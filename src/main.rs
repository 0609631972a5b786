mod actuator;
mod cancel;
mod config;
mod control;
mod duration;
mod predict;
mod tracker;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::actuator::{open_endpoint, ActuatorController};
use crate::cancel::{watch_stdin, CancelToken};
use crate::config::Config;
use crate::control::ControlLoop;
use crate::tracker::{FrameDirectory, ObjectTracker};

#[derive(Parser)]
#[command(name = "catch-o-mat")]
#[command(about = "Predicts where a falling object lands and moves the carriage there")]
struct Cli {
    /// Verbose per-frame logging
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Validate { config: String },
    /// Track, predict and actuate until the object is lost or `q` is entered
    Run {
        config: String,
        /// Directory of recorded frames, read in file name order
        #[arg(long)]
        frames: PathBuf,
        /// Overrides `actuator.endpoint` (`tcp://host:port` or a device path)
        #[arg(long)]
        endpoint: Option<String>,
        /// Write the run report (YAML) to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Validate { config } => validate(&config),
        Commands::Run {
            config,
            frames,
            endpoint,
            report,
        } => run(&config, frames, endpoint, report),
    }
}

fn validate(path: &str) -> ExitCode {
    match Config::from_file(path) {
        Ok(config) => {
            let cal = &config.calibration;
            println!("Configuration is valid");
            println!(
                "  color: {:?} .. {:?}",
                cal.color_lower, cal.color_upper
            );
            println!(
                "  scale: {} px/m, {} ticks/m, rail {} m",
                cal.px_per_meter, cal.ticks_per_meter, cal.rail_length
            );
            println!(
                "  retry budget: {}, dispatch attempts: {}",
                config.tracker.retry_budget, config.actuator.retry.max_attempts
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(
    path: &str,
    frames: PathBuf,
    endpoint: Option<String>,
    report_path: Option<PathBuf>,
) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let Some(endpoint) = endpoint.or_else(|| config.actuator.endpoint.clone()) else {
        log::error!("No actuator endpoint configured");
        return ExitCode::FAILURE;
    };

    let channel = match open_endpoint(&endpoint, &config.actuator) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to open actuator channel: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let tracker = ObjectTracker::new(
        FrameDirectory::new(frames),
        config.calibration.color_range(),
        &config.tracker,
    );
    let controller = ActuatorController::new(channel, &config.calibration, config.actuator.retry);

    let cancel = CancelToken::new();
    watch_stdin(cancel.clone());
    log::info!("Waiting for the object (enter q to stop)");

    let mut control = ControlLoop::new(&config, tracker, controller);
    let report = match control.run(&cancel) {
        Ok(r) => r,
        Err(e) => {
            log::error!("Control loop failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = report_path {
        if let Err(e) = report.save(&path) {
            log::error!("Failed to write report to {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
        log::info!("Report written to {}", path.display());
    }

    ExitCode::SUCCESS
}
