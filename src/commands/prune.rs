use anyhow::Result;
use clap::ArgMatches;

use crate::core::TelemetryConfig;
use crate::ui;

pub fn execute(_matches: &ArgMatches) -> Result<()> {
    let config = TelemetryConfig::load()?;
    let store = super::open_store(&config)?;

    let retention = config.retention_policy().retention;
    let removed = store.prune(retention)?;

    ui::success(&format!(
        "Removed {} records older than {} minutes",
        removed,
        retention.as_secs() / 60
    ));
    Ok(())
}
