//! Deadline and cancellation scope wrapped around collaborator calls.

use super::CancellationToken;
use crate::errors::{GenerationError, RetrievalError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Why a guarded call did not run to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupted {
    /// The scope's token was cancelled.
    Cancelled(String),
    /// The effective deadline passed.
    DeadlineExceeded {
        /// Time spent in the call before giving up.
        elapsed_ms: u64,
    },
}

impl From<Interrupted> for GenerationError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::Cancelled(reason) => Self::Cancelled { reason },
            Interrupted::DeadlineExceeded { elapsed_ms } => Self::Timeout { elapsed_ms },
        }
    }
}

impl From<Interrupted> for RetrievalError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::Cancelled(reason) => Self::embedding(format!("cancelled: {reason}")),
            Interrupted::DeadlineExceeded { elapsed_ms } => {
                Self::embedding(format!("deadline exceeded after {elapsed_ms}ms"))
            }
        }
    }
}

/// The cancellation token and optional overall deadline for one question.
///
/// Every generation and embedding call goes through [`CallScope::guard`],
/// which races the call against cancellation and the earlier of the
/// scope deadline and the per-call timeout.
#[derive(Debug, Clone)]
pub struct CallScope {
    token: Arc<CancellationToken>,
    deadline: Option<Instant>,
}

impl Default for CallScope {
    fn default() -> Self {
        Self::new()
    }
}

impl CallScope {
    /// Creates a scope with a fresh token and no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: Arc::new(CancellationToken::new()),
            deadline: None,
        }
    }

    /// Uses an existing token, so callers can cancel from outside.
    #[must_use]
    pub fn with_token(mut self, token: Arc<CancellationToken>) -> Self {
        self.token = token;
        self
    }

    /// Sets an overall deadline relative to now.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns the token.
    #[must_use]
    pub fn token(&self) -> &Arc<CancellationToken> {
        &self.token
    }

    /// Returns the overall deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Requests cancellation of everything running under this scope.
    pub fn cancel(&self, reason: impl Into<String>) {
        self.token.cancel(reason);
    }

    /// Reports whether the scope is already cancelled or past its deadline.
    #[must_use]
    pub fn interruption(&self) -> Option<Interrupted> {
        if self.token.is_cancelled() {
            return Some(Interrupted::Cancelled(self.cancel_reason()));
        }
        match self.deadline {
            Some(at) if Instant::now() >= at => Some(Interrupted::DeadlineExceeded { elapsed_ms: 0 }),
            _ => None,
        }
    }

    /// Runs a collaborator call under this scope.
    ///
    /// `call_timeout` bounds this single call; the scope deadline, if
    /// earlier, wins.
    ///
    /// # Errors
    ///
    /// Returns `Interrupted` if the scope is cancelled or the effective
    /// deadline passes before the call completes. The call's own result is
    /// passed through untouched otherwise.
    pub async fn guard<F, T>(&self, call_timeout: Option<Duration>, call: F) -> Result<T, Interrupted>
    where
        F: Future<Output = T>,
    {
        if let Some(interrupted) = self.interruption() {
            return Err(interrupted);
        }

        let start = Instant::now();
        let limit = match (self.deadline, call_timeout.map(|t| start + t)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        let bounded = async {
            match limit {
                Some(at) => tokio::time::timeout_at(at, call).await.map_err(|_| {
                    Interrupted::DeadlineExceeded {
                        elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                    }
                }),
                None => Ok(call.await),
            }
        };

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(Interrupted::Cancelled(self.cancel_reason())),
            result = bounded => result,
        }
    }

    fn cancel_reason(&self) -> String {
        self.token
            .reason()
            .unwrap_or_else(|| "cancelled".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guard_passes_through_result() {
        let scope = CallScope::new();
        let out = scope.guard(None, async { 7 }).await.unwrap();
        assert_eq!(out, 7);
    }

    #[tokio::test]
    async fn test_guard_rejects_when_already_cancelled() {
        let scope = CallScope::new();
        scope.cancel("shutdown");

        let err = scope.guard(None, async { 1 }).await.unwrap_err();
        assert_eq!(err, Interrupted::Cancelled("shutdown".to_string()));
    }

    #[tokio::test]
    async fn test_guard_call_timeout() {
        let scope = CallScope::new();
        let err = scope
            .guard(Some(Duration::from_millis(10)), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Interrupted::DeadlineExceeded { .. }));
    }

    #[tokio::test]
    async fn test_guard_scope_deadline_beats_call_timeout() {
        let scope = CallScope::new().with_timeout(Duration::from_millis(10));
        let started = Instant::now();
        let err = scope
            .guard(Some(Duration::from_secs(30)), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Interrupted::DeadlineExceeded { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_guard_cancel_during_call() {
        let scope = CallScope::new();
        let canceller = scope.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel("user abort");
        });

        let err = scope
            .guard(None, async {
                tokio::time::sleep(Duration::from_secs(5)).await;
            })
            .await
            .unwrap_err();

        assert_eq!(err, Interrupted::Cancelled("user abort".to_string()));
    }

    #[test]
    fn test_interrupted_conversions() {
        let gen: GenerationError = Interrupted::DeadlineExceeded { elapsed_ms: 5 }.into();
        assert_eq!(gen, GenerationError::Timeout { elapsed_ms: 5 });

        let gen: GenerationError = Interrupted::Cancelled("x".to_string()).into();
        assert!(gen.is_cancelled());

        let err: RetrievalError = Interrupted::DeadlineExceeded { elapsed_ms: 7 }.into();
        assert!(err.to_string().contains("7ms"));
    }
}
