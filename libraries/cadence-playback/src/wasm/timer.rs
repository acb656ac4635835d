//! `setInterval`/`setTimeout` scheduler

use crate::backend::{BackendSignal, SignalSink};
use crate::timer::{Scheduler, TimerHandle, MIN_PERIOD};
use gloo_timers::callback::{Interval, Timeout};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;

thread_local! {
    // Browser timers are not `Send`; handles refer to them by id
    static TIMERS: RefCell<HashMap<u64, Box<dyn Any>>> = RefCell::new(HashMap::new());
    static NEXT_ID: Cell<u64> = const { Cell::new(1) };
}

/// Scheduler backed by the page's timer functions
///
/// The default scheduler for `wasm32` builds with the `wasm` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebScheduler;

impl WebScheduler {
    /// Timers currently registered on this thread
    pub fn live_timers() -> usize {
        TIMERS.with(|timers| timers.borrow().len())
    }
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

fn register(timer: Box<dyn Any>) -> TimerHandle {
    let id = NEXT_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    TIMERS.with(|timers| timers.borrow_mut().insert(id, timer));

    TimerHandle::new(move || {
        // Dropping a gloo timer clears it; do so after the map borrow ends
        let timer = TIMERS.with(|timers| timers.borrow_mut().remove(&id));
        drop(timer);
    })
}

impl Scheduler for WebScheduler {
    fn every(&self, period: Duration, sink: SignalSink, signal: BackendSignal) -> TimerHandle {
        let interval = Interval::new(millis(period.max(MIN_PERIOD)), move || {
            sink.emit(signal.clone());
        });
        register(Box::new(interval))
    }

    fn after(&self, delay: Duration, sink: SignalSink, signal: BackendSignal) -> TimerHandle {
        let timeout = Timeout::new(millis(delay), move || {
            sink.emit(signal);
        });
        register(Box::new(timeout))
    }
}
