use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

use super::parse::{parse_usage_percent, parse_used_total};
use super::provider::SnapshotProvider;
use super::records::{
    CpuMetrics, DockerMetrics, MetricKind, MetricRecord, NetworkMetrics, UsageMetrics,
};
use super::store::HistoryStore;
use crate::core::scheduler::{spawn_periodic, Lifecycle, SchedulerState, SingleFlight};
use crate::error::Result;

pub const DEFAULT_COLLECT_INTERVAL: Duration = Duration::from_secs(10);

/// Outcome of one collection cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectReport {
    pub stored: Vec<MetricKind>,
    pub skipped: Vec<MetricKind>,
    /// True when another cycle was already running and this one did nothing
    pub overlapped: bool,
}

/// Samples every snapshot source on a fixed interval and appends the results
/// to the history store.
pub struct Collector {
    store: Arc<HistoryStore>,
    provider: Arc<dyn SnapshotProvider>,
    interval: Duration,
    lifecycle: Lifecycle,
    in_flight: SingleFlight,
}

impl Collector {
    pub fn new(
        store: Arc<HistoryStore>,
        provider: Arc<dyn SnapshotProvider>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            interval,
            lifecycle: Lifecycle::new("metrics collector"),
            in_flight: SingleFlight::new(),
        }
    }

    /// Take one sample immediately, then keep sampling on `handle` every interval.
    ///
    /// The first sample runs on the calling thread.
    pub fn start(self: &Arc<Self>, handle: &Handle) -> Result<()> {
        let shutdown = self.lifecycle.begin()?;

        self.collect();

        let collector = Arc::clone(self);
        spawn_periodic(handle, "metrics collector", self.interval, shutdown, move || {
            collector.collect();
        });

        Ok(())
    }

    /// Stop sampling. Calling this more than once is harmless.
    pub fn stop(&self) {
        self.lifecycle.stop();
    }

    pub fn state(&self) -> SchedulerState {
        self.lifecycle.state()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sample every kind once. A failing kind never keeps the others from
    /// being stored.
    pub fn collect(&self) -> CollectReport {
        let Some(_guard) = self.in_flight.try_enter() else {
            log::debug!("Metrics collection already in progress, skipping");
            return CollectReport {
                overlapped: true,
                ..Default::default()
            };
        };

        let now = Utc::now();
        let mut report = CollectReport::default();

        for kind in MetricKind::ALL {
            let record = match self.sample(kind, now) {
                Ok(record) => record,
                Err(e) => {
                    if e.is_skippable_sample() {
                        log::warn!("Skipping {} metrics: {}", kind, e);
                    } else {
                        log::error!("Error collecting {} metrics: {}", kind, e);
                    }
                    report.skipped.push(kind);
                    continue;
                }
            };

            match self.store.store(&record) {
                Ok(()) => report.stored.push(kind),
                Err(e) => {
                    log::error!("Error storing {} metrics: {}", kind, e);
                    report.skipped.push(kind);
                }
            }
        }

        log::debug!(
            "Collected metrics: {} stored, {} skipped",
            report.stored.len(),
            report.skipped.len()
        );
        report
    }

    fn sample(&self, kind: MetricKind, timestamp: DateTime<Utc>) -> Result<MetricRecord> {
        let provider = self.provider.as_ref();

        Ok(match kind {
            MetricKind::Cpu => MetricRecord::Cpu(CpuMetrics {
                timestamp,
                usage: parse_usage_percent(&provider.cpu_info()?)?,
            }),
            MetricKind::Ram => MetricRecord::Ram(usage_record(
                timestamp,
                &provider.ram_info()?,
                &provider.ram_details()?,
            )?),
            MetricKind::Disk => MetricRecord::Disk(usage_record(
                timestamp,
                &provider.disk_info()?,
                &provider.disk_details()?,
            )?),
            MetricKind::Docker => {
                let docker = provider.docker_status()?;
                MetricRecord::Docker(DockerMetrics {
                    timestamp,
                    daemon_running: docker.daemon_running,
                    containers_running: docker.containers_up,
                    containers_total: docker.containers_all,
                    images_count: docker.images_count,
                })
            }
            MetricKind::Network => {
                let network = provider.network_status()?;
                MetricRecord::Network(NetworkMetrics {
                    timestamp,
                    internet_connected: network.internet_connected,
                    ping_latency_ms: network.ping_latency_ms,
                    dns_working: network.dns_working,
                })
            }
        })
    }
}

fn usage_record(timestamp: DateTime<Utc>, info: &str, details: &str) -> Result<UsageMetrics> {
    let usage = parse_usage_percent(info)?;
    let (used_bytes, total_bytes) = parse_used_total(details)?;

    Ok(UsageMetrics {
        timestamp,
        usage,
        used_bytes,
        total_bytes,
    })
}
