// Platform-specific code module

pub mod command;
pub mod docker;
pub mod kill;
pub mod network;
pub mod ports;
pub mod system;

// Re-exports for cleaner imports
pub use kill::{CommandTerminator, DEFAULT_KILL_TIMEOUT};
pub use ports::{platform_port_enumerator, DEFAULT_PROBE_TIMEOUT};
pub use system::{HostSnapshotProvider, SysinfoProcessSource};
