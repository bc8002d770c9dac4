//! Background token revalidation

use crate::SessionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Used in place of a zero interval
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to the periodic revalidation task; the task stops when this is dropped
pub struct Revalidator {
    handle: JoinHandle<()>,
}

impl Revalidator {
    /// Re-verify the session every `interval` until it expires or is signed out
    pub fn spawn(session: Arc<SessionManager>, interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            warn!(
                min_interval_ms = MIN_INTERVAL.as_millis() as u64,
                "Revalidation interval must be non-zero; using the minimum"
            );
            MIN_INTERVAL
        } else {
            interval
        };

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                if !session.revalidate().await {
                    info!("Session no longer valid; stopping revalidation");
                    break;
                }
                debug!("Session revalidated");
            }
        });

        debug!(interval_ms = interval.as_millis() as u64, "Started session revalidation");
        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Revalidator {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
