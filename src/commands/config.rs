use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use crate::core::TelemetryConfig;
use crate::ui;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("set", sub_matches)) => handle_set(sub_matches),
        _ => handle_show(),
    }
}

fn handle_show() -> Result<()> {
    let config = TelemetryConfig::load()?;

    println!(
        "{} {}",
        "Config file:".bold(),
        TelemetryConfig::get_config_path()?.display()
    );
    println!(
        "{} {}",
        "Database:".bold(),
        config.database_path()?.display()
    );
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn handle_set(matches: &ArgMatches) -> Result<()> {
    let key = matches.get_one::<String>("key").context("Key is required")?;
    let value = matches
        .get_one::<String>("value")
        .context("Value is required")?;

    let mut config = TelemetryConfig::load()?;
    config.set(key, value)?;
    config.save()?;

    ui::success(&format!("{} = {}", key, value));
    Ok(())
}
