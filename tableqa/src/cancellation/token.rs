//! A shared stop signal for one or more question runs.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;
use tracing::debug;

/// Cooperative stop signal, usually held in an `Arc` and shared between
/// the caller and every [`CallScope`](super::CallScope) of a run.
///
/// The first reason wins; later calls to [`cancel`](Self::cancel) are
/// ignored.
#[derive(Default)]
pub struct CancellationToken {
    cancelled: AtomicBool,
    reason: RwLock<Option<String>>,
    notify: Notify,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop. Returns true if this call did the cancelling.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        let mut slot = self.reason.write();
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }
        let reason = reason.into();
        debug!(reason = %reason, "Cancellation requested");
        *slot = Some(reason);
        drop(slot);

        self.notify.notify_waiters();
        true
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// The winning reason, once cancelled.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.reason.read().clone()
    }

    /// Resolves once a stop has been requested.
    pub async fn cancelled(&self) {
        loop {
            // Subscribe before the flag check; a cancel in between would
            // otherwise be missed.
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_fresh_token() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert_eq!(token.reason(), None);
    }

    #[test]
    fn test_first_reason_wins() {
        let token = CancellationToken::new();
        assert!(token.cancel("operator stop"));
        assert!(!token.cancel("shutdown"));

        assert!(token.is_cancelled());
        assert_eq!(token.reason().as_deref(), Some("operator stop"));
    }

    #[tokio::test]
    async fn test_waiter_wakes_on_cancel() {
        let token = Arc::new(CancellationToken::new());
        let waiter = tokio::spawn({
            let token = token.clone();
            async move { token.cancelled().await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel("stop");

        assert!(tokio::time::timeout(Duration::from_secs(1), waiter).await.is_ok());
    }

    #[tokio::test]
    async fn test_already_cancelled_resolves_at_once() {
        let token = CancellationToken::new();
        token.cancel("early");
        assert!(tokio::time::timeout(Duration::from_millis(50), token.cancelled())
            .await
            .is_ok());
    }
}
