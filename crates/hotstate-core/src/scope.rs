// ── Controller lifecycle scope ──
//
// The cancellation authority for one controller: every task the cell or
// the shared stream spawns runs under this scope's token and is tracked so
// shutdown can wait for it.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

/// Cheaply cloneable handle to a cancellable task group.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A nested scope cancelled together with this one (but not vice versa).
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            tracker: TaskTracker::new(),
        }
    }

    /// The token observers and one-time events watch.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the scope is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            debug!("scope cancelled");
        }
        self.cancel.cancel();
    }

    /// Spawn `fut` on the current runtime, dropped at its next suspension
    /// point once the scope is cancelled.
    ///
    /// Resolves to `None` when the task was cut short by cancellation.
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<Option<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let cancel = self.cancel.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                out = fut => Some(out),
            }
        })
    }

    /// Spawn `fut` as a tracked task that is not raced against the scope.
    ///
    /// The task must watch [`token`](Self::token) itself; this lets it run
    /// its own cleanup when the scope ends.
    pub fn track<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(fut)
    }

    /// Number of tracked tasks still running.
    pub fn active_tasks(&self) -> usize {
        self.tracker.len()
    }

    /// Cancel and wait for every tracked task to finish.
    pub async fn shutdown(&self) {
        self.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        debug!("scope drained");
    }
}
