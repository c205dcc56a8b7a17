#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::config::BurstConfig;
use crate::domain::{BurstPhase, BurstRequest, BurstState, StatusReport};
use crate::error::{BurstError, Result};
use crate::metrics::Metrics;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RampSettings {
    pub step_bytes: usize,
    pub tick: Duration,
    pub hold_slice: Duration,
    pub max_ramp: Option<Duration>,
}

impl From<&BurstConfig> for RampSettings {
    fn from(cfg: &BurstConfig) -> Self {
        Self {
            step_bytes: cfg.step_bytes.max(1),
            tick: cfg.tick,
            hold_slice: cfg.hold_slice,
            max_ramp: cfg.max_ramp,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BurstOutcome {
    /// Ramp and hold ran through; the buffer sits at the (capped) target.
    Completed,
    /// Ended early by `stop`, `reset`, or a newer burst.
    Cancelled,
}

enum Step {
    Cancelled,
    Grew,
    Reached,
}

#[derive(Clone)]
pub struct BurstController {
    state: Arc<Mutex<BurstState>>,
    task: Arc<Mutex<Option<JoinHandle<BurstOutcome>>>>,
    settings: RampSettings,
    metrics: Metrics,
}

impl BurstController {
    pub fn new(cfg: &BurstConfig, metrics: Metrics) -> Self {
        metrics.set_cap(cfg.cap);
        Self {
            state: Arc::new(Mutex::new(BurstState::new(cfg.cap))),
            task: Arc::new(Mutex::new(None)),
            settings: RampSettings::from(cfg),
            metrics,
        }
    }

    /// Begin a burst on a background task and return immediately.
    pub fn start(&self, req: BurstRequest) -> Result<()> {
        let generation = self.begin(req)?;
        let this = self.clone();
        let handle = tokio::spawn(async move { this.drive(generation, req).await });
        *self.task.lock() = Some(handle);
        Ok(())
    }

    /// Run a whole burst inline, returning once it completes or is cancelled.
    pub async fn run_to_completion(&self, req: BurstRequest) -> Result<BurstOutcome> {
        let generation = self.begin(req)?;
        Ok(self.drive(generation, req).await)
    }

    /// Wait for the most recently spawned burst task, if any.
    pub async fn wait(&self) -> Option<BurstOutcome> {
        let handle = self.task.lock().take()?;
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!(error = %e, "burst task failed");
                None
            }
        }
    }

    /// Clear the running flag. Memory stays allocated. Returns whether a
    /// burst was running.
    pub fn stop(&self) -> bool {
        let mut st = self.state.lock();
        if !st.running {
            return false;
        }
        st.running = false;
        st.phase = BurstPhase::Stopped;
        self.metrics.mark_burst_cancelled();
        info!(generation = st.generation, current = st.current(), "burst stop requested");
        true
    }

    /// Stop any burst and free the stress buffer.
    pub fn reset(&self) {
        let mut st = self.state.lock();
        let was_running = st.running;
        st.running = false;
        st.phase = BurstPhase::Idle;
        st.block.release();
        self.metrics.set_current(0);
        self.metrics.clear_target();
        if was_running {
            self.metrics.mark_burst_cancelled();
        }
        info!(generation = st.generation, was_running, "reset");
    }

    /// Allocate `requested` bytes once, synchronously. Returns the applied
    /// size after capping.
    pub fn stress_once(&self, requested: usize) -> usize {
        let mut st = self.state.lock();
        let cap = st.cap;
        let applied = st.block.set_size(requested, cap);
        self.metrics.record_allocation(applied);
        info!(requested, applied, "stress once");
        applied
    }

    /// Replace the cap. A buffer above the new cap is shrunk right away.
    pub fn set_cap(&self, cap: Option<usize>) {
        let mut st = self.state.lock();
        st.cap = cap;
        self.metrics.set_cap(cap);
        if let Some(limit) = cap {
            if st.current() > limit {
                let applied = st.block.set_size(limit, cap);
                self.metrics.record_allocation(applied);
            }
        }
        info!(?cap, current = st.current(), "cap updated");
    }

    pub fn status(&self) -> StatusReport {
        let st = self.state.lock();
        StatusReport {
            running: st.running,
            phase: st.phase,
            current_size: st.current(),
            target_size: st.target,
            cap: st.cap,
            hold_seconds: st.hold.as_secs(),
            started_ts_seconds: st.started_ts_seconds,
        }
    }

    pub fn current_size(&self) -> usize {
        self.state.lock().current()
    }

    fn begin(&self, req: BurstRequest) -> Result<u64> {
        let mut st = self.state.lock();
        if st.running {
            warn!(generation = st.generation, "start rejected: burst already running");
            return Err(BurstError::AlreadyRunning);
        }
        st.running = true;
        st.phase = BurstPhase::Ramping;
        st.target = req.target;
        st.hold = req.hold;
        st.started_ts_seconds = Some(chrono::Utc::now().timestamp());
        st.generation = st.generation.wrapping_add(1);
        self.metrics.mark_burst_started(req.target);
        info!(
            generation = st.generation,
            target_bytes = req.target,
            hold_seconds = req.hold.as_secs(),
            cap = ?st.cap,
            "burst started"
        );
        Ok(st.generation)
    }

    async fn drive(&self, generation: u64, req: BurstRequest) -> BurstOutcome {
        let started = Instant::now();
        loop {
            match self.ramp_step(generation).await {
                Step::Cancelled => return self.cancelled(generation),
                Step::Reached => break,
                Step::Grew => {}
            }
            if let Some(max) = self.settings.max_ramp {
                if started.elapsed() >= max {
                    warn!(generation, max_seconds = max.as_secs(), "ramp time exceeded, ending ramp early");
                    break;
                }
            }
            sleep(self.settings.tick).await;
        }

        if !self.enter_hold(generation) {
            return self.cancelled(generation);
        }
        let remaining = req.hold.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            debug!(generation, "hold already elapsed, skipping");
        } else {
            let deadline = Instant::now()
                .checked_add(remaining)
                .unwrap_or_else(far_future);
            loop {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                sleep(self.settings.hold_slice.min(deadline - now)).await;
                if !self.is_active(generation) {
                    return self.cancelled(generation);
                }
            }
        }
        self.finish(generation).await
    }

    // Allocation and memset run on the blocking pool so the workers serving
    // the probes stay responsive.
    async fn off_runtime<T, F>(&self, f: F) -> Option<T>
    where
        F: FnOnce(&BurstController) -> T + Send + 'static,
        T: Send + 'static,
    {
        let this = self.clone();
        match tokio::task::spawn_blocking(move || f(&this)).await {
            Ok(v) => Some(v),
            Err(e) => {
                error!(error = %e, "blocking allocation task failed");
                None
            }
        }
    }

    async fn ramp_step(&self, generation: u64) -> Step {
        self.off_runtime(move |ctrl| ctrl.ramp_step_blocking(generation))
            .await
            .unwrap_or(Step::Cancelled)
    }

    fn ramp_step_blocking(&self, generation: u64) -> Step {
        let mut st = self.state.lock();
        if !st.is_active(generation) {
            return Step::Cancelled;
        }
        let goal = st.effective_target();
        let current = st.current();
        if current >= goal {
            return Step::Reached;
        }
        let next = current.saturating_add(self.settings.step_bytes).min(goal);
        let cap = st.cap;
        let applied = st.block.set_size(next, cap);
        self.metrics.record_allocation(applied);
        debug!(generation, applied, goal, "ramp step");
        if applied >= goal {
            Step::Reached
        } else {
            Step::Grew
        }
    }

    fn enter_hold(&self, generation: u64) -> bool {
        let mut st = self.state.lock();
        if !st.is_active(generation) {
            return false;
        }
        st.phase = BurstPhase::Holding;
        debug!(generation, current = st.current(), "holding");
        true
    }

    fn is_active(&self, generation: u64) -> bool {
        self.state.lock().is_active(generation)
    }

    async fn finish(&self, generation: u64) -> BurstOutcome {
        self.off_runtime(move |ctrl| ctrl.finish_blocking(generation))
            .await
            .unwrap_or(BurstOutcome::Cancelled)
    }

    fn finish_blocking(&self, generation: u64) -> BurstOutcome {
        let mut st = self.state.lock();
        if !st.is_active(generation) {
            return BurstOutcome::Cancelled;
        }
        let (target, cap) = (st.target, st.cap);
        let applied = st.block.set_size(target, cap);
        self.metrics.record_allocation(applied);
        st.running = false;
        st.phase = BurstPhase::Idle;
        self.metrics.mark_burst_completed();
        info!(generation, applied, "burst completed");
        BurstOutcome::Completed
    }

    fn cancelled(&self, generation: u64) -> BurstOutcome {
        info!(generation, current = self.current_size(), "burst ended by request");
        BurstOutcome::Cancelled
    }
}

fn far_future() -> Instant {
    // roughly 30 years
    Instant::now() + Duration::from_secs(86_400 * 365 * 30)
}
