//! Seams to the OS: process enumeration, socket listing, termination.
//!
//! Implementations live in the platform layer.

use std::collections::HashMap;

use super::types::{PortRecord, ProcessRecord, ProcessWithPorts};
use crate::error::Result;

/// Trait for raw process table enumeration
pub trait ProcessSource: Send + Sync {
    /// All accessible processes, in a stable enumeration order
    fn processes(&self) -> Result<Vec<ProcessRecord>>;
}

/// Trait for listing active sockets
///
/// One implementation per platform tool, all producing the same
/// [`PortRecord`] schema. Malformed lines are skipped; only a tool that
/// cannot run (or runs past its timeout) yields `DevexError::Probe`.
pub trait PortEnumerator: Send + Sync {
    /// Name of the external tool, for logs
    fn tool(&self) -> &'static str;

    fn enumerate(&self) -> Result<Vec<PortRecord>>;
}

/// Trait for OS-level process termination
pub trait ProcessTerminator: Send + Sync {
    /// Fails with `DevexError::Termination` when the request errors or times out.
    fn terminate(&self, pid: u32) -> Result<()>;
}

/// Join processes with their sockets by pid, keeping process order.
///
/// Sockets whose pid matches no process are dropped.
pub fn join_ports(processes: Vec<ProcessRecord>, ports: Vec<PortRecord>) -> Vec<ProcessWithPorts> {
    let mut by_pid: HashMap<u32, Vec<PortRecord>> = HashMap::new();
    for port in ports {
        by_pid.entry(port.pid).or_default().push(port);
    }

    processes
        .into_iter()
        .map(|process| {
            let ports = by_pid.remove(&process.pid).unwrap_or_default();
            ProcessWithPorts { process, ports }
        })
        .collect()
}

/// Enumerate processes and sockets and join them.
///
/// A failing port enumerator degrades to empty port lists; only a failing
/// process source is an error.
pub fn snapshot_processes(
    source: &dyn ProcessSource,
    ports: &dyn PortEnumerator,
) -> Result<Vec<ProcessWithPorts>> {
    let processes = source.processes()?;

    let sockets = match ports.enumerate() {
        Ok(sockets) => sockets,
        Err(e) => {
            log::warn!(
                "Port enumeration via {} failed, reporting processes without ports: {}",
                ports.tool(),
                e
            );
            Vec::new()
        }
    };

    Ok(join_ports(processes, sockets))
}
