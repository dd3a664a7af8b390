//! Shared plumbing for the periodic background loops.
//!
//! Each scheduler owns a [`Lifecycle`] (`Idle -> Running -> Stopped`) carrying
//! its own cancellation signal, and a [`SingleFlight`] guard so at most one
//! cycle of its work is in flight at a time.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::error::{DevexError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Start/stop state machine plus the cancellation channel of one scheduler
pub struct Lifecycle {
    name: &'static str,
    state: Mutex<SchedulerState>,
    shutdown_tx: watch::Sender<bool>,
}

impl Lifecycle {
    pub fn new(name: &'static str) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            name,
            state: Mutex::new(SchedulerState::Idle),
            shutdown_tx,
        }
    }

    /// Idle -> Running. Hands back the receiver the loop must watch.
    pub fn begin(&self) -> Result<watch::Receiver<bool>> {
        let mut state = self.state.lock();
        match *state {
            SchedulerState::Idle => {
                *state = SchedulerState::Running;
                Ok(self.shutdown_tx.subscribe())
            }
            SchedulerState::Running => Err(DevexError::lifecycle(format!(
                "{} is already running",
                self.name
            ))),
            SchedulerState::Stopped => Err(DevexError::lifecycle(format!(
                "{} has been stopped and cannot be restarted",
                self.name
            ))),
        }
    }

    /// Move to the terminal state. Returns false if already stopped.
    pub fn stop(&self) -> bool {
        let mut state = self.state.lock();
        if *state == SchedulerState::Stopped {
            return false;
        }
        *state = SchedulerState::Stopped;
        // No receivers is fine: nothing was started.
        self.shutdown_tx.send_replace(true);
        log::info!("{} stopped", self.name);
        true
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Non-queueing re-entrancy guard
#[derive(Debug, Default)]
pub struct SingleFlight {
    busy: AtomicBool,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot, or `None` if a cycle is already running.
    pub fn try_enter(&self) -> Option<FlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard { busy: &self.busy })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the [`SingleFlight`] slot on drop, including on panic.
pub struct FlightGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Run `job` every `period` on the blocking pool until `shutdown` flips.
///
/// The first run happens one period after spawning. Ticks that come due while
/// a run is still going are skipped, not queued. A run in progress when the
/// signal arrives is allowed to finish.
pub fn spawn_periodic<F>(
    handle: &Handle,
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    job: F,
) -> JoinHandle<()>
where
    F: Fn() + Send + Sync + 'static,
{
    let job = Arc::new(job);

    handle.spawn(async move {
        log::info!("Starting {} with interval: {:?}", name, period);

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if *shutdown.borrow() {
                break;
            }

            // Shutdown wins over a tick that is due in the same poll
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // Sender dropped along with its owner
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let job = Arc::clone(&job);
                    if let Err(e) = tokio::task::spawn_blocking(move || job()).await {
                        log::error!("{} cycle failed: {}", name, e);
                    }
                }
            }
        }

        log::debug!("{} loop exited", name);
    })
}
