// Command handlers module
pub mod config;
pub mod history;
pub mod kill;
pub mod port;
pub mod prune;
pub mod ps;
pub mod run;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::core::process::ProcessManager;
use crate::core::{HistoryStore, TelemetryConfig};
use crate::platform::{platform_port_enumerator, CommandTerminator, SysinfoProcessSource};

/// Process manager over the host, refreshed once, for one-shot commands
fn loaded_process_manager(config: &TelemetryConfig) -> Result<Arc<ProcessManager>> {
    let timeout = config.command_timeout();
    let manager = Arc::new(ProcessManager::new(
        Arc::new(SysinfoProcessSource::new()),
        platform_port_enumerator(timeout),
        Arc::new(CommandTerminator::new(timeout)),
        config.process_refresh_interval(),
    ));
    manager.set_max_processes(config.max_processes);

    if !manager.refresh() {
        anyhow::bail!("Failed to enumerate processes");
    }
    Ok(manager)
}

fn open_store(config: &TelemetryConfig) -> Result<HistoryStore> {
    let path = config.database_path()?;
    HistoryStore::open(&path).with_context(|| format!("Failed to open metrics database {:?}", path))
}
