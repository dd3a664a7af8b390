//! Metric history: sampling, persistence and retention.
//!
//! The [`Collector`] samples every [`SnapshotProvider`] kind on a fixed
//! interval and appends records to the [`HistoryStore`]; the [`Pruner`]
//! evicts records older than the retention window on its own period.

mod collector;
pub mod parse;
mod provider;
mod records;
mod retention;
mod store;

pub use collector::{CollectReport, Collector, DEFAULT_COLLECT_INTERVAL};
pub use parse::{convert_to_bytes, format_bytes};
pub use provider::{DockerSnapshot, NetworkSnapshot, SnapshotProvider};
pub use records::{
    CpuMetrics, DockerMetrics, HistorySeries, MetricKind, MetricRecord, NetworkMetrics,
    TimeSeriesPoint, UsageMetrics,
};
pub use retention::{Pruner, RetentionPolicy, DEFAULT_PRUNE_INTERVAL, DEFAULT_RETENTION};
pub use store::HistoryStore;
