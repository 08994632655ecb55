//! Periodic trigger for collection runs
//!
//! One run per tick, never two at once. Ticks that fall due while a run is in
//! progress collapse into a single tick fired right after it; the cadence then
//! resumes one full interval later. Stopping never interrupts a run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::orchestrator::CollectionRun;
use crate::{CollectorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Running,
    /// Terminal
    Stopped,
}

pub struct Scheduler {
    runner: Arc<dyn CollectionRun>,
    interval: Duration,
    cancellation_token: CancellationToken,
    state: Arc<watch::Sender<SchedulerState>>,
    started: AtomicBool,
}

impl Scheduler {
    /// Fails when `interval` is zero
    pub fn new(runner: Arc<dyn CollectionRun>, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(CollectorError::config("Collection interval must be greater than zero"));
        }

        let (state, _) = watch::channel(SchedulerState::Idle);
        Ok(Self {
            runner,
            interval,
            cancellation_token: CancellationToken::new(),
            state: Arc::new(state),
            started: AtomicBool::new(false),
        })
    }

    /// Spawn the tick loop. The first run fires one interval from now.
    pub fn start(&self) -> Result<JoinHandle<()>> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(CollectorError::AlreadyStarted);
        }

        info!(interval_secs = self.interval.as_secs_f64(), "Starting collection scheduler");

        let tick_loop = TickLoop {
            runner: self.runner.clone(),
            interval: self.interval,
            token: self.cancellation_token.clone(),
            state: self.state.clone(),
        };
        Ok(tokio::spawn(tick_loop.run()))
    }

    /// Request the loop to stop; an in-flight run still completes
    pub fn stop(&self) {
        debug!("Stopping collection scheduler");
        self.cancellation_token.cancel();
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }
}

struct TickLoop {
    runner: Arc<dyn CollectionRun>,
    interval: Duration,
    token: CancellationToken,
    state: Arc<watch::Sender<SchedulerState>>,
}

impl TickLoop {
    async fn run(self) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            self.state.send_replace(SchedulerState::Running);
            self.run_once().await;
            self.state.send_replace(SchedulerState::Idle);
        }

        self.state.send_replace(SchedulerState::Stopped);
        info!("Collection scheduler stopped");
    }

    /// A panic inside the run stays in its own task
    async fn run_once(&self) {
        let runner = self.runner.clone();
        match tokio::spawn(async move { runner.run().await }).await {
            Ok(Ok(report)) => {
                debug!(persisted = report.persisted, zones = report.zones, "Scheduled run complete");
            }
            Ok(Err(e)) if e.is_nothing_to_collect() => info!("{}", e),
            Ok(Err(e)) => error!("Collection run failed: {}", e),
            Err(e) if e.is_panic() => error!("Collection run panicked: {}", e),
            Err(e) => warn!("Collection run aborted: {}", e),
        }
    }
}
