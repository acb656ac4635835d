//! Embedded platform SDK loading
//!
//! The platform SDK is a page-wide resource: it is injected at most once and
//! announces readiness through a single global callback. Every embedded
//! backend that needs it registers a waiter; all waiters are notified with
//! [`EmbedSignal::SdkReady`] when the host reports the SDK ready.

use super::{EmbedSignal, SignalSink};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug)]
enum SdkState {
    NotRequested,
    Loading { waiters: Vec<SignalSink> },
    Ready,
}

/// Process-wide SDK load state
#[derive(Debug)]
pub struct SdkLoader {
    state: Mutex<SdkState>,
    ready_tx: watch::Sender<bool>,
}

impl SdkLoader {
    pub fn new() -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            state: Mutex::new(SdkState::NotRequested),
            ready_tx,
        }
    }

    /// Shared loader for the whole page
    pub fn global() -> Arc<SdkLoader> {
        static GLOBAL: OnceLock<Arc<SdkLoader>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(SdkLoader::new())))
    }

    /// Ask for the SDK on behalf of `waiter`
    ///
    /// Returns `true` if the SDK is already usable. Otherwise `waiter` will
    /// receive [`EmbedSignal::SdkReady`] later, and `inject` runs only if
    /// this is the first request.
    pub fn request(&self, waiter: &SignalSink, inject: impl FnOnce()) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        match &mut *state {
            SdkState::Ready => return true,
            SdkState::Loading { waiters } => {
                waiters.push(waiter.clone());
                return false;
            }
            SdkState::NotRequested => {}
        }

        *state = SdkState::Loading {
            waiters: vec![waiter.clone()],
        };

        // The host may report readiness synchronously from inside `inject`
        drop(state);
        debug!("Injecting embedded platform SDK");
        inject();
        false
    }

    /// Host callback: the SDK finished loading
    pub fn mark_ready(&self) {
        let previous = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *state, SdkState::Ready)
        };

        if let SdkState::Loading { waiters } = previous {
            debug!(waiters = waiters.len(), "Embedded platform SDK ready");
            for waiter in waiters {
                waiter.embed(EmbedSignal::SdkReady);
            }
        }

        self.ready_tx.send_replace(true);
    }

    pub fn is_ready(&self) -> bool {
        *self.ready_tx.borrow()
    }

    /// Resolve once the SDK is ready
    pub async fn wait_ready(&self) {
        let mut ready = self.ready_tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = ready.wait_for(|ready| *ready).await;
    }
}

impl Default for SdkLoader {
    fn default() -> Self {
        Self::new()
    }
}
