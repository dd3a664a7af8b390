use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::TelemetryConfig;
use crate::ui;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let port = *matches.get_one::<u16>("port").context("Port is required")?;
    let json_output = matches.get_flag("json");

    let config = TelemetryConfig::load()?;
    let manager = super::loaded_process_manager(&config)?;
    let owners = manager.search_by_port(port);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&owners)?);
    } else {
        ui::print_port_owners(port, &owners);
    }

    Ok(())
}
