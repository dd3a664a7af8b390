//! Metric record shapes persisted by the history store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DevexError;

/// The metric kinds that get one table each in the history store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Cpu,
    Ram,
    Disk,
    Docker,
    Network,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Cpu,
        MetricKind::Ram,
        MetricKind::Disk,
        MetricKind::Docker,
        MetricKind::Network,
    ];

    /// Table backing this kind. Only ever interpolated from this fixed set.
    pub fn table_name(self) -> &'static str {
        match self {
            MetricKind::Cpu => "cpu_metrics",
            MetricKind::Ram => "ram_metrics",
            MetricKind::Disk => "disk_metrics",
            MetricKind::Docker => "docker_metrics",
            MetricKind::Network => "network_metrics",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Cpu => "cpu",
            MetricKind::Ram => "ram",
            MetricKind::Disk => "disk",
            MetricKind::Docker => "docker",
            MetricKind::Network => "network",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = DevexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(MetricKind::Cpu),
            "ram" | "memory" | "mem" => Ok(MetricKind::Ram),
            "disk" => Ok(MetricKind::Disk),
            "docker" => Ok(MetricKind::Docker),
            "network" | "net" => Ok(MetricKind::Network),
            other => Err(DevexError::config(format!("unknown metric kind: {}", other))),
        }
    }
}

/// A single point of a charted series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuMetrics {
    pub timestamp: DateTime<Utc>,
    pub usage: f64,
}

/// Shared shape of the RAM and disk records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageMetrics {
    pub timestamp: DateTime<Utc>,
    pub usage: f64,
    pub used_bytes: u64,
    pub total_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockerMetrics {
    pub timestamp: DateTime<Utc>,
    pub daemon_running: bool,
    pub containers_running: u32,
    pub containers_total: u32,
    pub images_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub timestamp: DateTime<Utc>,
    pub internet_connected: bool,
    pub ping_latency_ms: f64,
    pub dns_working: bool,
}

/// One immutable sample, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MetricRecord {
    Cpu(CpuMetrics),
    Ram(UsageMetrics),
    Disk(UsageMetrics),
    Docker(DockerMetrics),
    Network(NetworkMetrics),
}

impl MetricRecord {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricRecord::Cpu(_) => MetricKind::Cpu,
            MetricRecord::Ram(_) => MetricKind::Ram,
            MetricRecord::Disk(_) => MetricKind::Disk,
            MetricRecord::Docker(_) => MetricKind::Docker,
            MetricRecord::Network(_) => MetricKind::Network,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            MetricRecord::Cpu(m) => m.timestamp,
            MetricRecord::Ram(m) | MetricRecord::Disk(m) => m.timestamp,
            MetricRecord::Docker(m) => m.timestamp,
            MetricRecord::Network(m) => m.timestamp,
        }
    }
}

/// Result of a history query, shaped per kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HistorySeries {
    Points(Vec<TimeSeriesPoint>),
    Docker(Vec<DockerMetrics>),
    Network(Vec<NetworkMetrics>),
}

impl HistorySeries {
    /// Empty series of the right shape for `kind`
    pub fn empty(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Cpu | MetricKind::Ram | MetricKind::Disk => HistorySeries::Points(Vec::new()),
            MetricKind::Docker => HistorySeries::Docker(Vec::new()),
            MetricKind::Network => HistorySeries::Network(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            HistorySeries::Points(v) => v.len(),
            HistorySeries::Docker(v) => v.len(),
            HistorySeries::Network(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
