//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `queue_batcher` library that handles:
//! - Environment variable loading (.env file)
//! - Command-line argument parsing
//! - Logger initialization
//! - Exiting with status 1 on configuration or startup errors
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use log::error;
use std::process;

use queue_batcher::initialization::init_logger_with;
use queue_batcher::{run_monitor, Config, Opt};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the variables may come from the environment
    let _ = dotenvy::dotenv();

    let opt = Opt::parse();

    let log_level = opt.log_level.clone();
    let log_format = opt.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    let config = match Config::try_from(opt) {
        Ok(config) => config,
        Err(e) => {
            error!("Error: {}", e);
            process::exit(1);
        }
    };

    match run_monitor(config).await {
        Ok(report) => {
            println!(
                "Stopped after {} tick{} ({} drain{}, {} records persisted) in {:.1}s",
                report.ticks,
                if report.ticks == 1 { "" } else { "s" },
                report.drains,
                if report.drains == 1 { "" } else { "s" },
                report.persisted_records,
                report.elapsed_seconds
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("queue_batcher error: {:#}", e);
            process::exit(1);
        }
    }
}
