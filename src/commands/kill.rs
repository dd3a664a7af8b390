use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::TelemetryConfig;
use crate::ui;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let pid = *matches.get_one::<u32>("pid").context("PID is required")?;
    let skip_confirm = matches.get_flag("yes");

    let config = TelemetryConfig::load()?;
    let manager = super::loaded_process_manager(&config)?;

    let name = manager
        .get_processes()
        .iter()
        .find(|p| p.process.pid == pid)
        .map(|p| p.process.name.clone());

    let target = match &name {
        Some(name) => format!("{} ({})", pid, name),
        None => pid.to_string(),
    };

    if !skip_confirm && !ui::confirm(&format!("Force-kill process {}?", target))? {
        ui::dimmed("Cancelled");
        return Ok(());
    }

    manager
        .kill_process_by_pid(pid)
        .with_context(|| format!("Failed to kill process {}", target))?;

    ui::success(&format!("Killed process {}", target));
    Ok(())
}
