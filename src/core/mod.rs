// Core business logic module

pub mod config;
pub mod history;
pub mod process;
pub mod scheduler;
pub mod telemetry;

// Re-export commonly used items
pub use config::TelemetryConfig;
pub use history::{HistorySeries, HistoryStore, MetricKind};
pub use process::{ProcessManager, ProcessWithPorts};
pub use scheduler::SchedulerState;
pub use telemetry::{Telemetry, TelemetryParts, TelemetryRuntime, DEFAULT_TOP_PROCESSES};
