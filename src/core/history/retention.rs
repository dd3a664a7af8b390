//! Periodic eviction of records older than the retention window.

use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

use super::store::HistoryStore;
use crate::core::scheduler::{spawn_periodic, Lifecycle, SchedulerState, SingleFlight};
use crate::error::Result;

pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_PRUNE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub retention: Duration,
    pub prune_interval: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            prune_interval: DEFAULT_PRUNE_INTERVAL,
        }
    }
}

impl RetentionPolicy {
    /// Oldest a record can get before a prune cycle removes it
    pub fn worst_case_age(&self) -> Duration {
        self.retention + self.prune_interval
    }
}

/// Runs [`HistoryStore::prune`] on its own period, independent of sampling.
pub struct Pruner {
    store: Arc<HistoryStore>,
    policy: RetentionPolicy,
    lifecycle: Lifecycle,
    in_flight: SingleFlight,
}

impl Pruner {
    pub fn new(store: Arc<HistoryStore>, policy: RetentionPolicy) -> Self {
        Self {
            store,
            policy,
            lifecycle: Lifecycle::new("history pruner"),
            in_flight: SingleFlight::new(),
        }
    }

    pub fn start(self: &Arc<Self>, handle: &Handle) -> Result<()> {
        let shutdown = self.lifecycle.begin()?;

        let pruner = Arc::clone(self);
        spawn_periodic(
            handle,
            "history pruner",
            self.policy.prune_interval,
            shutdown,
            move || {
                pruner.prune_now();
            },
        );

        Ok(())
    }

    pub fn stop(&self) {
        self.lifecycle.stop();
    }

    pub fn state(&self) -> SchedulerState {
        self.lifecycle.state()
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// One prune cycle. Failures are logged; the count is 0 in that case.
    pub fn prune_now(&self) -> usize {
        let Some(_guard) = self.in_flight.try_enter() else {
            return 0;
        };

        match self.store.prune(self.policy.retention) {
            Ok(removed) => {
                if removed > 0 {
                    log::info!("Pruned {} records older than {:?}", removed, self.policy.retention);
                }
                removed
            }
            Err(e) => {
                log::error!("Error cleaning up old data: {}", e);
                0
            }
        }
    }
}
