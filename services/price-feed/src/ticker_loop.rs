//! Background ticker loop
//!
//! Lifecycle is an explicit `Stopped -> Running -> Stopped` state machine
//! behind an async mutex, so transitions never interleave: `stop()` holds
//! the lock until the task has fully exited, and a concurrent `start()`
//! waits for it.
//!
//! Each cycle is `sleep(interval) -> tick -> broadcast`. Shutdown is a
//! oneshot raced against both the sleep and the fan-out.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use types::ticker::TickerUpdate;

use crate::broadcast::{BroadcastOutcome, Broadcaster};
use crate::metrics::FeedMetrics;
use crate::registry::ConnectionRegistry;
use crate::store::PriceStore;
use crate::sync::lock;
use crate::tick::TickGenerator;

/// Shared handles one tick/broadcast cycle needs.
#[derive(Clone)]
pub(crate) struct TickCycle {
    pub(crate) prices: Arc<Mutex<PriceStore>>,
    pub(crate) generator: Arc<Mutex<TickGenerator>>,
    pub(crate) registry: Arc<ConnectionRegistry>,
    pub(crate) broadcaster: Arc<Broadcaster>,
    pub(crate) metrics: Arc<FeedMetrics>,
}

impl TickCycle {
    /// Advance every price once. Locks generator then store; nothing else
    /// takes both.
    fn tick(&self, now: DateTime<Utc>) -> Vec<TickerUpdate> {
        let mut generator = lock(&self.generator);
        let faults_before = generator.faults();
        let batch = {
            let mut prices = lock(&self.prices);
            generator.tick(&mut prices, now)
        };
        self.metrics.record_tick(generator.faults() - faults_before);
        batch
    }

    /// One tick followed by one broadcast to the current membership.
    pub(crate) async fn run_once(&self) -> BroadcastOutcome {
        let batch = self.tick(Utc::now());
        let subscribers = self.registry.snapshot();
        self.broadcaster.broadcast(batch, subscribers).await
    }

    async fn run(self, period: Duration, mut shutdown: oneshot::Receiver<()>) {
        info!(period_ms = period.as_millis() as u64, "Ticker loop started");
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(period) => {}
            }

            let cycle = AssertUnwindSafe(self.run_once()).catch_unwind();
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                result = cycle => match result {
                    Ok(outcome) => debug!(
                        delivered = outcome.delivered,
                        failed = outcome.failed,
                        "Tick cycle complete"
                    ),
                    Err(_) => {
                        self.metrics.record_cycle_panic();
                        error!("Tick cycle panicked; continuing with next cycle");
                    }
                },
            }
        }
        info!("Ticker loop stopped");
    }
}

enum LoopState {
    Stopped,
    Running {
        shutdown: oneshot::Sender<()>,
        handle: JoinHandle<()>,
    },
}

/// Restartable periodic tick/broadcast task.
pub struct TickerLoop {
    period: Duration,
    cycle: TickCycle,
    state: AsyncMutex<LoopState>,
}

impl TickerLoop {
    pub(crate) fn new(period: Duration, cycle: TickCycle) -> Self {
        Self {
            period,
            cycle,
            state: AsyncMutex::new(LoopState::Stopped),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Launch the loop unless one is already running.
    ///
    /// Returns true if a new loop was spawned. A loop whose task has
    /// already exited counts as stopped.
    pub async fn start(&self) -> bool {
        let mut state = self.state.lock().await;
        if let LoopState::Running { handle, .. } = &*state {
            if !handle.is_finished() {
                debug!("Ticker loop already running");
                return false;
            }
            warn!("Previous ticker loop exited on its own; restarting");
        }

        let (shutdown, signal) = oneshot::channel();
        let handle = tokio::spawn(self.cycle.clone().run(self.period, signal));
        *state = LoopState::Running { shutdown, handle };
        true
    }

    /// Stop the loop and wait until its task has exited.
    ///
    /// Returns true if a loop was running.
    pub async fn stop(&self) -> bool {
        let mut state = self.state.lock().await;
        let LoopState::Running { shutdown, handle } =
            std::mem::replace(&mut *state, LoopState::Stopped)
        else {
            return false;
        };

        // The task may already be gone; then the send fails and the join
        // below returns immediately.
        let _ = shutdown.send(());
        match handle.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => debug!("Ticker loop task cancelled"),
            Err(e) => error!(error = %e, "Ticker loop task terminated abnormally"),
        }
        true
    }

    /// Whether a loop task is currently alive.
    pub async fn is_running(&self) -> bool {
        match &*self.state.lock().await {
            LoopState::Running { handle, .. } => !handle.is_finished(),
            LoopState::Stopped => false,
        }
    }

    /// Run a single cycle now, independent of the schedule.
    pub async fn tick_once(&self) -> BroadcastOutcome {
        self.cycle.run_once().await
    }
}
