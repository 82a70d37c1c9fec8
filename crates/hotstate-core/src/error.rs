// ── Core error types ──
//
// `Failure` is the payload of a failed domain operation. It is cheap to
// clone because every subscriber of a shared stream receives its own copy
// of the state that carries it.
//
// `CoreError` is what a subscription terminates with. Operation failures
// never surface here; they live inside `AsyncState` as one-time events.

use std::sync::Arc;

use thiserror::Error;

/// A failed domain operation or upstream production step.
///
/// Keeps the rendered message for display and, when built from a concrete
/// error, the original error as its source.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Failure {
    message: String,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Failure {
    /// A failure carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a concrete error, keeping it reachable through `source()`.
    pub fn from_error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: err.to_string(),
            source: Some(Arc::new(err)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl PartialEq for Failure {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

impl Eq for Failure {}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Terminal outcome of a [`Subscription`](crate::Subscription).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The upstream production raised instead of yielding a value. Every
    /// subscriber attached at that moment receives this once.
    #[error("upstream production failed: {0}")]
    Upstream(Failure),

    /// The owning scope was cancelled, or the subscription outlived the
    /// stream it was attached to.
    #[error("scope cancelled")]
    Cancelled,
}

impl CoreError {
    /// `true` for the lifecycle-driven termination, `false` for upstream faults.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
