//! Tokio runtime and facade that wires the background services together.
//!
//! [`Telemetry`] owns the history store, the collector, the pruner and the
//! process manager, and runs their loops on a dedicated [`TelemetryRuntime`].

use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};

use super::config::TelemetryConfig;
use super::history::{
    CollectReport, Collector, HistorySeries, HistoryStore, MetricKind, Pruner, SnapshotProvider,
};
use super::process::{
    PortEnumerator, ProcessManager, ProcessSource, ProcessTerminator, ProcessWithPorts,
};
use crate::error::{DevexError, Result};
use crate::platform::{
    platform_port_enumerator, CommandTerminator, HostSnapshotProvider, SysinfoProcessSource,
};

/// Number of entries the ranked process views return by default
pub const DEFAULT_TOP_PROCESSES: usize = 30;

/// Wrapper around the Tokio runtime the background loops run on.
pub struct TelemetryRuntime {
    runtime: Runtime,
}

impl TelemetryRuntime {
    /// Multi-thread runtime with 2 worker threads and timers enabled
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .thread_name("telemetry-worker")
            .build()?;

        Ok(Self { runtime })
    }

    pub fn handle(&self) -> &Handle {
        self.runtime.handle()
    }

    /// Wait up to `timeout` for in-flight work, then drop the runtime.
    pub fn shutdown(self, timeout: Duration) {
        self.runtime.shutdown_timeout(timeout);
    }
}

/// Everything [`Telemetry::new`] needs besides the config
pub struct TelemetryParts {
    pub store: Arc<HistoryStore>,
    pub provider: Arc<dyn SnapshotProvider>,
    pub source: Arc<dyn ProcessSource>,
    pub ports: Arc<dyn PortEnumerator>,
    pub terminator: Arc<dyn ProcessTerminator>,
}

pub struct Telemetry {
    store: Arc<HistoryStore>,
    collector: Arc<Collector>,
    pruner: Arc<Pruner>,
    processes: Arc<ProcessManager>,
    runtime: TelemetryRuntime,
}

impl Telemetry {
    pub fn new(parts: TelemetryParts, config: &TelemetryConfig) -> Result<Self> {
        let collector = Arc::new(Collector::new(
            Arc::clone(&parts.store),
            parts.provider,
            config.collect_interval(),
        ));

        let pruner = Arc::new(Pruner::new(
            Arc::clone(&parts.store),
            config.retention_policy(),
        ));

        let processes = Arc::new(ProcessManager::new(
            parts.source,
            parts.ports,
            parts.terminator,
            config.process_refresh_interval(),
        ));
        processes.set_max_processes(config.max_processes);

        Ok(Self {
            store: parts.store,
            collector,
            pruner,
            processes,
            runtime: TelemetryRuntime::new()?,
        })
    }

    /// Host-backed services: sysinfo, the platform socket tool, the platform
    /// kill command, and the on-disk store from `config`.
    pub fn from_config(config: &TelemetryConfig) -> Result<Self> {
        let db_path = config
            .database_path()
            .map_err(|e| DevexError::config(e.to_string()))?;
        let timeout = config.command_timeout();

        let parts = TelemetryParts {
            store: Arc::new(HistoryStore::open(&db_path)?),
            provider: Arc::new(HostSnapshotProvider::new(timeout)),
            source: Arc::new(SysinfoProcessSource::new()),
            ports: platform_port_enumerator(timeout),
            terminator: Arc::new(CommandTerminator::new(timeout)),
        };

        Self::new(parts, config)
    }

    /// Start the collector, the pruner and the process manager.
    ///
    /// The first metrics sample and the first process refresh happen before
    /// this returns.
    pub fn start(&self) -> Result<()> {
        let handle = self.runtime.handle();

        self.collector.start(handle)?;
        self.pruner.start(handle)?;
        self.processes.start(handle)?;

        log::info!(
            "Telemetry started (sampling every {:?}, {} min retention)",
            self.collector.interval(),
            self.pruner.policy().retention.as_secs() / 60
        );
        Ok(())
    }

    /// Stop every background loop. Safe to call more than once.
    pub fn stop(&self) {
        self.collector.stop();
        self.pruner.stop();
        self.processes.stop();
    }

    /// Stop the loops and tear down the runtime.
    pub fn shutdown(self) {
        self.stop();
        self.runtime.shutdown(Duration::from_secs(2));
        log::info!("Telemetry shut down");
    }

    /// Records of `kind` from the last `minutes`, oldest first.
    ///
    /// Never fails: a store error is logged and yields an empty series.
    pub fn history(&self, kind: MetricKind, minutes: u64) -> HistorySeries {
        let window = Duration::from_secs(minutes.saturating_mul(60));
        match self.store.query(kind, window) {
            Ok(series) => series,
            Err(e) => {
                log::error!("Error reading {} history: {}", kind, e);
                HistorySeries::empty(kind)
            }
        }
    }

    pub fn collect_now(&self) -> CollectReport {
        self.collector.collect()
    }

    pub fn prune_now(&self) -> usize {
        self.pruner.prune_now()
    }

    pub fn refresh_processes(&self) -> bool {
        self.processes.refresh()
    }

    pub fn processes(&self) -> Arc<Vec<ProcessWithPorts>> {
        self.processes.get_processes()
    }

    pub fn search_by_port(&self, port: u16) -> Vec<ProcessWithPorts> {
        self.processes.search_by_port(port)
    }

    pub fn top_by_memory(&self, limit: usize) -> Vec<ProcessWithPorts> {
        self.processes.top_by_memory(limit)
    }

    pub fn top_by_cpu(&self, limit: usize) -> Vec<ProcessWithPorts> {
        self.processes.top_by_cpu(limit)
    }

    /// Terminate `pid`; the process cache refreshes in the background.
    pub fn kill_process(&self, pid: u32) -> Result<()> {
        let _runtime = self.runtime.handle().enter();
        self.processes.kill_process_by_pid(pid)
    }

    pub fn store(&self) -> &Arc<HistoryStore> {
        &self.store
    }

    pub fn collector(&self) -> &Arc<Collector> {
        &self.collector
    }

    pub fn pruner(&self) -> &Arc<Pruner> {
        &self.pruner
    }

    pub fn process_manager(&self) -> &Arc<ProcessManager> {
        &self.processes
    }
}
