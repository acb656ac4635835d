//! Timer scheduling
//!
//! Backends and the controller never sleep. Periodic polls and one-shot
//! watchdogs are delegated to a [`Scheduler`], which delivers a signal through
//! a [`SignalSink`] when the timer fires. Dropping the returned
//! [`TimerHandle`] cancels the timer.

use crate::backend::{BackendSignal, SignalSink};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Cancels its timer when dropped
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    /// Handle that runs `cancel` when dropped
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Handle for a timer that was never started
    pub fn inert() -> Self {
        Self { cancel: None }
    }

    /// Cancel explicitly (same as dropping)
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

/// Shortest period a periodic timer runs at
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Source of periodic and one-shot timers
pub trait Scheduler: Send + Sync {
    /// Emit `signal` through `sink` every `period`, first after one period
    fn every(&self, period: Duration, sink: SignalSink, signal: BackendSignal) -> TimerHandle;

    /// Emit `signal` through `sink` once after `delay`
    fn after(&self, delay: Duration, sink: SignalSink, signal: BackendSignal) -> TimerHandle;
}

/// Scheduler backed by the ambient tokio runtime
///
/// Timers are skipped with a warning when called outside a runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn every(&self, period: Duration, sink: SignalSink, signal: BackendSignal) -> TimerHandle {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(?period, "No tokio runtime, periodic timer not started");
            return TimerHandle::inert();
        };
        let period = period.max(MIN_PERIOD);

        let task = runtime.spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if !sink.emit(signal.clone()) {
                    break;
                }
            }
        });

        TimerHandle::new(move || task.abort())
    }

    fn after(&self, delay: Duration, sink: SignalSink, signal: BackendSignal) -> TimerHandle {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(?delay, "No tokio runtime, one-shot timer not started");
            return TimerHandle::inert();
        };

        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            sink.emit(signal);
        });

        TimerHandle::new(move || task.abort())
    }
}

/// Scheduler for the build target
///
/// [`WebScheduler`](crate::wasm::WebScheduler) for `wasm32` with the `wasm`
/// feature, [`TokioScheduler`] everywhere else.
pub fn default_scheduler() -> Arc<dyn Scheduler> {
    #[cfg(all(feature = "wasm", target_arch = "wasm32"))]
    {
        Arc::new(crate::wasm::WebScheduler)
    }
    #[cfg(not(all(feature = "wasm", target_arch = "wasm32")))]
    {
        Arc::new(TokioScheduler)
    }
}
