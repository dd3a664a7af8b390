//! Live process/port cache with periodic refresh.
//!
//! The cache holds one generation: an `Arc` to a complete list. A refresh
//! builds the next list without holding any lock and then swaps the `Arc`
//! under a write lock held only for the swap, so readers see either the old
//! or the new generation in full and are never blocked by a slow refresh.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

use super::source::{snapshot_processes, PortEnumerator, ProcessSource, ProcessTerminator};
use super::types::ProcessWithPorts;
use crate::core::scheduler::{spawn_periodic, Lifecycle, SchedulerState, SingleFlight};
use crate::error::Result;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_PROCESSES: usize = 300;

#[derive(Default)]
struct Generation {
    processes: Arc<Vec<ProcessWithPorts>>,
    updated_at: Option<DateTime<Utc>>,
}

pub struct ProcessManager {
    source: Arc<dyn ProcessSource>,
    ports: Arc<dyn PortEnumerator>,
    terminator: Arc<dyn ProcessTerminator>,
    current: RwLock<Generation>,
    max_processes: Mutex<usize>,
    refresh_interval: Duration,
    lifecycle: Lifecycle,
    in_flight: SingleFlight,
}

impl ProcessManager {
    pub fn new(
        source: Arc<dyn ProcessSource>,
        ports: Arc<dyn PortEnumerator>,
        terminator: Arc<dyn ProcessTerminator>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            source,
            ports,
            terminator,
            current: RwLock::new(Generation::default()),
            max_processes: Mutex::new(DEFAULT_MAX_PROCESSES),
            refresh_interval,
            lifecycle: Lifecycle::new("process manager"),
            in_flight: SingleFlight::new(),
        }
    }

    /// Refresh immediately on the calling thread, then every interval on `handle`.
    pub fn start(self: &Arc<Self>, handle: &Handle) -> Result<()> {
        let shutdown = self.lifecycle.begin()?;

        self.refresh();

        let manager = Arc::clone(self);
        spawn_periodic(
            handle,
            "process manager",
            self.refresh_interval,
            shutdown,
            move || {
                manager.refresh();
            },
        );

        Ok(())
    }

    /// Stop periodic refreshes. Calling this more than once is harmless.
    pub fn stop(&self) {
        self.lifecycle.stop();
    }

    pub fn state(&self) -> SchedulerState {
        self.lifecycle.state()
    }

    /// Rebuild the cache and publish it as the new generation.
    ///
    /// Returns false without doing anything when a refresh is already in
    /// flight, or when enumeration failed (the previous generation stays).
    pub fn refresh(&self) -> bool {
        let Some(_guard) = self.in_flight.try_enter() else {
            log::debug!("Process update already in progress, skipping");
            return false;
        };

        let mut processes = match snapshot_processes(self.source.as_ref(), self.ports.as_ref()) {
            Ok(processes) => processes,
            Err(e) => {
                log::error!("Error updating processes: {}", e);
                return false;
            }
        };

        let limit = *self.max_processes.lock();
        processes.truncate(limit);
        let count = processes.len();

        let next = Generation {
            processes: Arc::new(processes),
            updated_at: Some(Utc::now()),
        };
        *self.current.write() = next;

        log::debug!("Process cache refreshed with {} entries", count);
        true
    }

    /// The current generation. Cheap: clones an `Arc`.
    pub fn get_processes(&self) -> Arc<Vec<ProcessWithPorts>> {
        Arc::clone(&self.current.read().processes)
    }

    pub fn last_update_time(&self) -> Option<DateTime<Utc>> {
        self.current.read().updated_at
    }

    /// Every cached process with a socket on `port`, in cache order.
    pub fn search_by_port(&self, port: u16) -> Vec<ProcessWithPorts> {
        self.get_processes()
            .iter()
            .filter(|p| p.uses_port(port))
            .cloned()
            .collect()
    }

    /// Top `limit` cached processes by resident memory, highest first
    pub fn top_by_memory(&self, limit: usize) -> Vec<ProcessWithPorts> {
        self.ranked(limit, |a, b| b.process.memory_bytes.cmp(&a.process.memory_bytes))
    }

    /// Top `limit` cached processes by CPU usage, highest first
    pub fn top_by_cpu(&self, limit: usize) -> Vec<ProcessWithPorts> {
        self.ranked(limit, |a, b| {
            b.process
                .cpu_percent
                .partial_cmp(&a.process.cpu_percent)
                .unwrap_or(Ordering::Equal)
        })
    }

    fn ranked<F>(&self, limit: usize, compare: F) -> Vec<ProcessWithPorts>
    where
        F: FnMut(&ProcessWithPorts, &ProcessWithPorts) -> Ordering,
    {
        let mut processes = self.get_processes().as_ref().clone();
        processes.sort_by(compare);
        processes.truncate(limit);
        processes
    }

    /// Terminate `pid`, then refresh the cache in the background.
    ///
    /// The refresh is not awaited; the cache converges on its own.
    pub fn kill_process_by_pid(self: &Arc<Self>, pid: u32) -> Result<()> {
        self.terminator.terminate(pid)?;
        log::info!("Terminated process {}", pid);

        self.spawn_refresh();
        Ok(())
    }

    /// Takes effect on the next refresh.
    pub fn set_max_processes(&self, max: usize) {
        *self.max_processes.lock() = max;
    }

    pub fn max_processes(&self) -> usize {
        *self.max_processes.lock()
    }

    fn spawn_refresh(self: &Arc<Self>) {
        let manager = Arc::clone(self);
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || {
                    manager.refresh();
                });
            }
            Err(_) => {
                std::thread::spawn(move || {
                    manager.refresh();
                });
            }
        }
    }
}
