//! Listening session analytics
//!
//! A stream is counted the first time a track is observed playing. The marker
//! only moves when a different track starts, so pausing and resuming the same
//! track never double counts, while replaying it after another track does.

use crate::types::Track;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Boxed error returned by stream counters
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Remote "stream started" counter
#[async_trait]
pub trait StreamCounter: Send + Sync {
    async fn record_stream(&self, track_id: &str) -> Result<(), BoxError>;
}

/// Fires [`StreamCounter::record_stream`] once per listening session
pub struct SessionTracker {
    counter: Option<Arc<dyn StreamCounter>>,
    last_tracked: Option<String>,
}

impl SessionTracker {
    pub fn new(counter: Arc<dyn StreamCounter>) -> Self {
        Self {
            counter: Some(counter),
            last_tracked: None,
        }
    }

    /// Tracker that never reports
    pub fn disabled() -> Self {
        Self {
            counter: None,
            last_tracked: None,
        }
    }

    /// Id of the last track a stream was counted for
    pub fn last_tracked(&self) -> Option<&str> {
        self.last_tracked.as_deref()
    }

    /// Observe the controller's state after a transition
    ///
    /// Returns `true` if a stream was fired. The call is fire-and-forget: the
    /// marker moves even if the remote call later fails.
    pub fn observe(&mut self, current: Option<&Track>, is_playing: bool) -> bool {
        let Some(track) = current else {
            return false;
        };
        if !is_playing || self.last_tracked.as_deref() == Some(track.id.as_str()) {
            return false;
        }

        self.last_tracked = Some(track.id.clone());
        self.fire(track.id.clone());
        true
    }

    fn fire(&self, track_id: String) {
        let Some(counter) = self.counter.clone() else {
            return;
        };

        let task = async move {
            match counter.record_stream(&track_id).await {
                Ok(()) => debug!(track_id = %track_id, "Stream recorded"),
                Err(e) => warn!(track_id = %track_id, error = %e, "Failed to record stream"),
            }
        };

        spawn_detached(task);
    }
}

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
fn spawn_detached(task: impl std::future::Future<Output = ()> + 'static) {
    wasm_bindgen_futures::spawn_local(task);
}

#[cfg(not(all(feature = "wasm", target_arch = "wasm32")))]
fn spawn_detached(task: impl std::future::Future<Output = ()> + Send + 'static) {
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(task);
        }
        Err(_) => warn!("No tokio runtime, stream not recorded"),
    }
}

impl std::fmt::Debug for SessionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTracker")
            .field("enabled", &self.counter.is_some())
            .field("last_tracked", &self.last_tracked)
            .finish()
    }
}
