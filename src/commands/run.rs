//! Foreground telemetry service: sample, prune and refresh until Ctrl+C.

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::core::{Telemetry, TelemetryConfig};

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let mut config = TelemetryConfig::load()?;
    if let Some(&secs) = matches.get_one::<u64>("interval") {
        config.collect_interval_secs = secs;
    }

    let telemetry = Telemetry::from_config(&config).context("Failed to initialise telemetry")?;

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();

    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::Relaxed);
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    telemetry.start().context("Failed to start telemetry")?;

    println!("{}", "Collecting host telemetry".cyan().bold());
    println!(
        "{}",
        format!("Database: {}", config.database_path()?.display()).dimmed()
    );
    println!("{}", "Press Ctrl+C to stop".dimmed());

    while !stop_flag.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(200));
    }

    println!();
    println!("{}", "Stopping...".yellow());
    telemetry.shutdown();

    Ok(())
}
