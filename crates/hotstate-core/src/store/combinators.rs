// ── Async update combinators ──
//
// `Loading` is published before anything is spawned, so an observer never
// sees the operation running without the flag. The settle step takes the
// cell lock again; overlapping operations are not cancelled and whichever
// completes last determines the final state.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::debug;

use super::StateCell;
use crate::error::Failure;
use crate::event::OneTimeEvent;

impl<T: Clone + Send + Sync + 'static> StateCell<T> {
    /// Run `operation` against the current data and store its result.
    ///
    /// Sequence: `Loading(data)` immediately; the operation then runs on the
    /// cell's scope; `Idle(new)` on `Ok`, `Failed(data, event)` on `Err`.
    /// The returned handle resolves once the cell has settled, or to `None`
    /// if the scope was cancelled first. On an already cancelled scope the
    /// operation is never started and the state is not touched.
    pub fn update_with<F, Fut>(&self, operation: F) -> JoinHandle<Option<()>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<T, Failure>> + Send + 'static,
    {
        if self.inner.scope.is_cancelled() {
            return self.abandoned();
        }
        let data = self.begin();
        let pending = operation(data);
        let cell = self.clone();
        self.inner.scope.spawn(async move {
            let outcome = pending.await;
            cell.settle(outcome);
        })
    }

    /// Like [`update_with`](Self::update_with) for operations that report
    /// only success or failure; on success the data is left as it is.
    pub fn run_with<F, Fut>(&self, operation: F) -> JoinHandle<Option<()>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<(), Failure>> + Send + 'static,
    {
        if self.inner.scope.is_cancelled() {
            return self.abandoned();
        }
        let data = self.begin();
        let pending = operation(data);
        let cell = self.clone();
        self.inner.scope.spawn(async move {
            match pending.await {
                Ok(()) => cell.update(|state| {
                    let data = state.data.clone();
                    state.succeed(data)
                }),
                Err(failure) => cell.settle(Err(failure)),
            }
        })
    }

    /// A handle that resolves to `None` without running anything.
    fn abandoned(&self) -> JoinHandle<Option<()>> {
        debug!("update requested on a cancelled scope; ignored");
        self.inner.scope.spawn(std::future::ready(()))
    }

    /// Publish `Loading` and hand back the data the operation starts from.
    fn begin(&self) -> T {
        self.transition(|state| (state.clone().begin(), state.data.clone()))
    }

    fn settle(&self, outcome: Result<T, Failure>) {
        match outcome {
            Ok(data) => self.update(|state| state.succeed(data)),
            Err(failure) => {
                debug!(error = %failure, "update failed");
                let event = OneTimeEvent::scoped(failure, self.inner.scope.token());
                self.update(|state| state.fail_with(event));
            }
        }
    }
}
