use anyhow::Result;
use clap::ArgMatches;

use crate::core::{TelemetryConfig, DEFAULT_TOP_PROCESSES};
use crate::ui;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let sort = matches
        .get_one::<String>("sort")
        .map(String::as_str)
        .unwrap_or("mem");
    let limit = matches
        .get_one::<usize>("limit")
        .copied()
        .unwrap_or(DEFAULT_TOP_PROCESSES);
    let json_output = matches.get_flag("json");

    let config = TelemetryConfig::load()?;
    let manager = super::loaded_process_manager(&config)?;

    let processes = if sort == "cpu" {
        // CPU usage is measured between two refreshes
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        manager.refresh();
        manager.top_by_cpu(limit)
    } else {
        manager.top_by_memory(limit)
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&processes)?);
    } else {
        ui::print_processes(&processes);
    }

    Ok(())
}
