// ── Controller abstraction ──
//
// One controller owns one scope, one cell and one shared stream. The
// stream's upstream is the cell's change feed; a controller built over a
// data source additionally pipes the source into the cell for as long as
// the upstream runs, so a grace-period teardown also stops observation.

use std::future::Future;
use std::sync::Arc;

use futures_core::Stream;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::SharingConfig;
use crate::error::Failure;
use crate::scope::Scope;
use crate::source::DataSource;
use crate::state::AsyncState;
use crate::store::StateCell;
use crate::stream::{SharedStream, Subscription};

/// Per-screen state owner.
///
/// Observers only [`subscribe`](Self::subscribe); writes go through the
/// update combinators. Dropping the controller cancels its scope, which
/// terminates every subscription with [`CoreError::Cancelled`](crate::CoreError::Cancelled).
pub struct StateController<T: Clone + Send + Sync + 'static> {
    scope: Scope,
    cell: StateCell<T>,
    stream: SharedStream<AsyncState<T>>,
}

impl<T: Clone + Send + Sync + 'static> StateController<T> {
    /// A controller with its own root scope.
    pub fn new(initial: AsyncState<T>, config: SharingConfig) -> Self {
        Self::with_scope(Scope::new(), initial, config)
    }

    /// A controller whose lifetime is bound to `scope`.
    pub fn with_scope(scope: Scope, initial: AsyncState<T>, config: SharingConfig) -> Self {
        let cell = StateCell::new(initial.clone(), scope.clone(), &config);
        let feed = cell.clone();
        let stream =
            SharedStream::infallible(initial, scope.clone(), config, move || feed.changes());
        Self {
            scope,
            cell,
            stream,
        }
    }

    /// A controller that mirrors `source` into its cell while observed.
    ///
    /// Every source emission replaces the state with `Idle(value)`. A source
    /// error terminates the current subscribers; the next subscription
    /// observes the source again from scratch.
    pub fn observing<S>(
        scope: Scope,
        initial: AsyncState<T>,
        source: S,
        config: SharingConfig,
    ) -> Self
    where
        S: DataSource<T>,
    {
        let cell = StateCell::new(initial.clone(), scope.clone(), &config);
        let feed = cell.clone();
        let source: Arc<dyn DataSource<T>> = Arc::new(source);
        let stream = SharedStream::new(initial, scope.clone(), config, move || {
            mirror(feed.clone(), Arc::clone(&source))
        });
        Self {
            scope,
            cell,
            stream,
        }
    }

    pub fn subscribe(&self) -> Subscription<AsyncState<T>> {
        self.stream.subscribe()
    }

    pub fn stream(&self) -> &SharedStream<AsyncState<T>> {
        &self.stream
    }

    pub fn cell(&self) -> &StateCell<T> {
        &self.cell
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Current state of the cell (not the stream's cache).
    pub fn state(&self) -> AsyncState<T> {
        self.cell.snapshot()
    }

    pub fn update_state(&self, f: impl FnOnce(&T) -> T) {
        self.cell.update_state(f);
    }

    pub fn update_with<F, Fut>(&self, operation: F) -> JoinHandle<Option<()>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<T, Failure>> + Send + 'static,
    {
        self.cell.update_with(operation)
    }

    pub fn run_with<F, Fut>(&self, operation: F) -> JoinHandle<Option<()>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<(), Failure>> + Send + 'static,
    {
        self.cell.run_with(operation)
    }

    /// Cancel the scope and wait for in-flight work and timers to finish.
    pub async fn shutdown(&self) {
        self.scope.shutdown().await;
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for StateController<T> {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

/// Upstream for [`StateController::observing`]: yields the cell's changes
/// while feeding source values into the cell.
fn mirror<T: Clone + Send + Sync + 'static>(
    cell: StateCell<T>,
    source: Arc<dyn DataSource<T>>,
) -> impl Stream<Item = Result<AsyncState<T>, Failure>> + Send + 'static {
    enum Step<V> {
        Changed(Option<AsyncState<V>>),
        Observed(Option<Result<V, Failure>>),
    }

    async_stream::stream! {
        let mut changes = Box::pin(cell.changes());
        let mut values = source.observe();
        let mut observing = true;

        if let Some(first) = changes.next().await {
            yield Ok(first);
        }
        loop {
            let step = tokio::select! {
                biased;
                change = changes.next() => Step::Changed(change),
                item = values.next(), if observing => Step::Observed(item),
            };
            match step {
                Step::Changed(Some(state)) => yield Ok(state),
                Step::Changed(None) => break,
                Step::Observed(Some(Ok(data))) => cell.replace(AsyncState::new(data)),
                Step::Observed(Some(Err(failure))) => {
                    yield Err(failure);
                    break;
                }
                Step::Observed(None) => {
                    debug!("data source completed");
                    observing = false;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures_util::stream::{self, BoxStream};

    use super::*;
    use crate::error::CoreError;
    use crate::state::Phase;

    struct Fixed(Vec<Result<u32, Failure>>);

    impl DataSource<u32> for Fixed {
        fn observe(&self) -> BoxStream<'static, Result<u32, Failure>> {
            stream::iter(self.0.clone()).chain(stream::pending()).boxed()
        }
    }

    #[tokio::test]
    async fn observing_mirrors_source_into_cell() {
        let controller = StateController::observing(
            Scope::new(),
            AsyncState::loading(0),
            Fixed(vec![Ok(4), Ok(5)]),
            SharingConfig::default(),
        );
        let mut sub = controller.subscribe();

        let first = sub.recv().await.unwrap();
        assert_eq!(first.phase(), Phase::Loading);
        assert_eq!(sub.recv().await.unwrap().data, 4);
        let last = sub.recv().await.unwrap();
        assert_eq!(last.data, 5);
        assert_eq!(last.phase(), Phase::Idle);
        assert_eq!(controller.state().data, 5);
    }

    #[tokio::test]
    async fn source_failure_terminates_subscribers() {
        let controller = StateController::observing(
            Scope::new(),
            AsyncState::new(0),
            Fixed(vec![Err(Failure::new("prefs unreadable"))]),
            SharingConfig::default(),
        );
        let mut sub = controller.subscribe();
        assert_eq!(sub.recv().await.unwrap().data, 0);
        assert_eq!(
            sub.recv().await.unwrap_err(),
            CoreError::Upstream(Failure::new("prefs unreadable"))
        );
    }

    #[tokio::test]
    async fn dropping_controller_cancels_subscribers() {
        let controller = StateController::new(AsyncState::new(1u8), SharingConfig::default());
        let mut sub = controller.subscribe();
        assert_eq!(sub.recv().await.unwrap().data, 1);

        drop(controller);
        assert_eq!(sub.recv().await, Err(CoreError::Cancelled));
        assert_eq!(sub.recv().await, Err(CoreError::Cancelled));
    }
}
