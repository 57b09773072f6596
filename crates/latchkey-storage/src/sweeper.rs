//! Background eviction of stale nonces.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::nonce::NonceStore;

/// Shortest sweep period accepted; `tokio::time::interval` panics on zero.
const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(1);

/// Handle to a running sweep task.
///
/// The task stops when [`shutdown`](NonceSweeper::shutdown) is awaited or the
/// handle is dropped. Only `shutdown` waits for the task to finish; dropping
/// just signals it.
#[derive(Debug)]
pub struct NonceSweeper {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl NonceSweeper {
    /// Spawn a task that calls [`NonceStore::sweep_expired`] every `period`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(store: Arc<dyn NonceStore>, period: Duration) -> Self {
        let period = period.max(MIN_SWEEP_PERIOD);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = ticker.tick() => match store.sweep_expired() {
                        Ok(0) => {},
                        Ok(evicted) => debug!(evicted, remaining = store.len(), "swept stale nonces"),
                        Err(e) => warn!(error = %e, "nonce sweep failed"),
                    },
                }
            }
            debug!("nonce sweeper stopped");
        });

        debug!(period_ms = period.as_millis(), "nonce sweeper started");
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Whether the sweep task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Signal the task to stop and wait until it has exited.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            warn!(error = %e, "nonce sweeper task failed");
        }
    }
}

impl Drop for NonceSweeper {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
