use anyhow::{Context, Result};
use clap::ArgMatches;
use std::time::Duration;

use crate::core::{MetricKind, TelemetryConfig};
use crate::ui;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let kind: MetricKind = matches
        .get_one::<String>("kind")
        .context("Metric kind is required")?
        .parse()?;
    let minutes = matches.get_one::<u64>("minutes").copied().unwrap_or(60);
    let json_output = matches.get_flag("json");

    let config = TelemetryConfig::load()?;
    let store = super::open_store(&config)?;

    let series = store.query(kind, Duration::from_secs(minutes.saturating_mul(60)))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&series)?);
    } else {
        ui::print_history(kind, &series);
    }

    Ok(())
}
