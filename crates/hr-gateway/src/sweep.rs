//! Periodic session sweep
//!
//! Sessions are reaped lazily on access when they pass the protocol
//! timeout; the sweep is a separate memory-reclamation pass that drops
//! sessions the caller simply abandoned and never dialled back into.
//! The same tick also evicts stale rate-limiter windows.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use hr_core::SessionStore;

use crate::rate_limit::RateLimiter;

/// Handle for the running sweep task
pub struct SweepHandle {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl SweepHandle {
    /// Stop the sweep task and wait for it to finish
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
    }
}

/// Start the periodic sweep over a session store.
///
/// `retention` is how long an idle session is kept before it is dropped;
/// `interval` is how often the sweep runs.
pub fn start_sweep(
    store: Arc<SessionStore>,
    rate_limiter: Arc<RateLimiter>,
    retention: Duration,
    interval: Duration,
) -> SweepHandle {
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
    let shutdown_tx_clone = shutdown_tx.clone();

    let handle = tokio::spawn(async move {
        info!(
            "Session sweep started (every {:?}, retention {:?})",
            interval, retention
        );

        let max_idle = chrono::Duration::from_std(retention)
            .unwrap_or_else(|_| chrono::Duration::seconds(3600));
        let mut ticker = tokio::time::interval(interval);
        // Consume the immediate first tick; nothing to sweep at startup
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = store.sweep(max_idle);
                    if removed > 0 {
                        info!("Sweep removed {} idle session(s)", removed);
                    } else {
                        debug!("Sweep found no idle sessions");
                    }
                    rate_limiter.cleanup().await;
                }
                _ = shutdown_rx.recv() => {
                    info!("Session sweep shutting down");
                    break;
                }
            }
        }
    });

    SweepHandle {
        shutdown_tx: shutdown_tx_clone,
        handle,
    }
}
