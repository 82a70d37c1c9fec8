// ── State cell ──
//
// One mutex guards read-modify-write, and the change is broadcast while
// the lock is still held, so the feed carries updates in exactly the
// order they were applied.

use std::sync::Arc;

use futures_core::Stream;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::config::SharingConfig;
use crate::scope::Scope;
use crate::state::AsyncState;

/// A controller-owned cell holding the current [`AsyncState`].
///
/// Cloning yields another handle to the same cell. Observers should read
/// through a [`SharedStream`](crate::SharedStream) fed by
/// [`changes`](Self::changes) rather than mutating it.
pub struct StateCell<T> {
    pub(super) inner: Arc<CellInner<T>>,
}

pub(super) struct CellInner<T> {
    pub(super) state: Mutex<AsyncState<T>>,
    pub(super) changes: broadcast::Sender<AsyncState<T>>,
    pub(super) scope: Scope,
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> StateCell<T> {
    pub fn new(initial: AsyncState<T>, scope: Scope, config: &SharingConfig) -> Self {
        let (changes, _) = broadcast::channel(config.channel_capacity());
        Self {
            inner: Arc::new(CellInner {
                state: Mutex::new(initial),
                changes,
                scope,
            }),
        }
    }

    /// The scope async updates run on.
    pub fn scope(&self) -> &Scope {
        &self.inner.scope
    }

    /// Current value.
    pub fn snapshot(&self) -> AsyncState<T> {
        self.inner.state.lock().clone()
    }

    /// Apply a pure transform to the data; `loading`/`error` are kept.
    ///
    /// Concurrent callers are serialized: each sees the previous result.
    pub fn update_state(&self, f: impl FnOnce(&T) -> T) {
        self.update(|state| state.map_data(f));
    }

    /// Whole-state read-modify-write.
    pub fn update(&self, f: impl FnOnce(AsyncState<T>) -> AsyncState<T>) {
        self.transition(|state| (f(state.clone()), ()));
    }

    /// Compute the next state (plus a side value) under the lock and publish it.
    pub(super) fn transition<R>(
        &self,
        f: impl FnOnce(&AsyncState<T>) -> (AsyncState<T>, R),
    ) -> R {
        let mut guard = self.inner.state.lock();
        let (next, out) = f(&guard);
        *guard = next.clone();
        // No receivers is fine: the feed is only live while a stream runs.
        let _ = self.inner.changes.send(next);
        out
    }

    /// Overwrite the state.
    pub fn replace(&self, state: AsyncState<T>) {
        self.update(|_| state);
    }

    /// The current value followed by every subsequent state, in order.
    ///
    /// The snapshot and the channel subscription are taken under the same
    /// lock, so nothing is missed or repeated between them. A reader that
    /// falls more than the configured capacity behind loses the oldest
    /// updates.
    pub fn changes(&self) -> impl Stream<Item = AsyncState<T>> + Send + use<T> {
        let (first, mut rx) = {
            let guard = self.inner.state.lock();
            (guard.clone(), self.inner.changes.subscribe())
        };

        async_stream::stream! {
            yield first;
            loop {
                match rx.recv().await {
                    Ok(state) => yield state,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "state feed lagged; oldest updates dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures_util::StreamExt;

    use super::*;
    use crate::state::Phase;

    fn cell(initial: u32) -> StateCell<u32> {
        StateCell::new(AsyncState::new(initial), Scope::new(), &SharingConfig::default())
    }

    #[test]
    fn update_state_transforms_data() {
        let cell = cell(1);
        cell.update_state(|n| n + 1);
        cell.update_state(|n| n * 10);
        assert_eq!(cell.snapshot().data, 20);
        assert_eq!(cell.snapshot().phase(), Phase::Idle);
    }

    #[test]
    fn concurrent_update_state_loses_nothing() {
        let cell = cell(0);
        std::thread::scope(|s| {
            for _ in 0..8 {
                let cell = cell.clone();
                s.spawn(move || {
                    for _ in 0..500 {
                        cell.update_state(|n| n + 1);
                    }
                });
            }
        });
        assert_eq!(cell.snapshot().data, 4000);
    }

    #[tokio::test]
    async fn changes_start_with_current_value() {
        let cell = cell(5);
        let mut changes = Box::pin(cell.changes());
        cell.update_state(|n| n + 1);
        cell.replace(AsyncState::loading(9));

        assert_eq!(changes.next().await.unwrap().data, 5);
        assert_eq!(changes.next().await.unwrap().data, 6);
        let last = changes.next().await.unwrap();
        assert_eq!(last.data, 9);
        assert!(last.loading);
    }
}
