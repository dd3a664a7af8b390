//! Process monitoring: a cached, periodically refreshed view of running
//! processes joined with the network ports they own.

mod manager;
mod source;
mod types;

pub use manager::{ProcessManager, DEFAULT_MAX_PROCESSES, DEFAULT_REFRESH_INTERVAL};
pub use source::{join_ports, snapshot_processes, PortEnumerator, ProcessSource, ProcessTerminator};
pub use types::{PortRecord, ProcessRecord, ProcessWithPorts, Protocol};
