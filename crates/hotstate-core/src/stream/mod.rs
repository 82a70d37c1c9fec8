// ── Hot shared streams ──
//
// One upstream production multicast to every subscriber, with the latest
// value cached for replay. Lifecycle is driven by the subscriber count:
// the first subscriber starts the upstream, the last one leaving arms a
// grace timer, and the timer firing with nobody attached tears the
// upstream down and drops the cache.

mod subscription;

use std::fmt;
use std::sync::{Arc, Weak};

use futures_core::Stream;
use futures_util::FutureExt;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SharingConfig;
use crate::error::Failure;
use crate::scope::Scope;

pub use subscription::Subscription;

/// Builds a fresh upstream each time production (re)starts.
type Producer<T> = dyn Fn() -> BoxStream<'static, Result<T, Failure>> + Send + Sync;

/// Identity of one upstream run. A new id means production restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UpstreamId(u64);

impl fmt::Display for UpstreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upstream#{}", self.0)
    }
}

/// What travels from the upstream task to subscribers.
#[derive(Debug, Clone)]
enum Signal<T> {
    Value(T),
    Failed(Failure),
}

/// A hot, multicast, replay-latest stream.
///
/// Cheaply cloneable; every clone shares the same upstream and cache.
/// [`subscribe`](Self::subscribe) must be called from within a Tokio
/// runtime since it may spawn the upstream task.
pub struct SharedStream<T> {
    inner: Arc<Shared<T>>,
}

struct Shared<T> {
    initial: T,
    producer: Box<Producer<T>>,
    config: SharingConfig,
    scope: Scope,
    life: Mutex<Lifecycle<T>>,
}

struct Lifecycle<T> {
    latest: T,
    subscribers: usize,
    signals: broadcast::Sender<Signal<T>>,
    upstream: Option<Upstream>,
    grace: Option<CancellationToken>,
    runs: u64,
}

struct Upstream {
    id: UpstreamId,
    cancel: CancellationToken,
}

impl<T> Clone for SharedStream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> SharedStream<T> {
    /// Share a fallible upstream. `initial` is replayed until the upstream
    /// produces, and again after every teardown.
    pub fn new<F, S>(initial: T, scope: Scope, config: SharingConfig, producer: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Stream<Item = Result<T, Failure>> + Send + 'static,
    {
        let (signals, _) = broadcast::channel(config.channel_capacity());
        Self {
            inner: Arc::new(Shared {
                initial: initial.clone(),
                producer: Box::new(move || producer().boxed()),
                config,
                scope,
                life: Mutex::new(Lifecycle {
                    latest: initial,
                    subscribers: 0,
                    signals,
                    upstream: None,
                    grace: None,
                    runs: 0,
                }),
            }),
        }
    }

    /// Share an upstream that cannot fail.
    pub fn infallible<F, S>(initial: T, scope: Scope, config: SharingConfig, producer: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Stream<Item = T> + Send + 'static,
    {
        Self::new(initial, scope, config, move || producer().map(Ok))
    }

    /// Attach a new observer.
    ///
    /// The handle first yields the cached value, then every later update in
    /// production order. Starts the upstream if none is running and cancels
    /// a pending grace-period shutdown. On a cancelled scope the handle is
    /// returned already terminated with [`CoreError::Cancelled`](crate::CoreError::Cancelled).
    pub fn subscribe(&self) -> Subscription<T> {
        let shared = &self.inner;
        let cancel = shared.scope.token();
        if cancel.is_cancelled() {
            debug!("subscribe on a cancelled scope");
            return Subscription::detached(cancel);
        }

        let mut life = shared.life.lock();
        if let Some(grace) = life.grace.take() {
            grace.cancel();
            debug!("resubscribed within grace period; shutdown cancelled");
        }
        let id = match life.upstream.as_ref() {
            Some(upstream) => upstream.id,
            None => Shared::start(shared, &mut life),
        };
        life.subscribers += 1;
        debug!(upstream = %id, subscribers = life.subscribers, "subscribed");

        Subscription::attached(
            Arc::clone(shared),
            id,
            life.latest.clone(),
            life.signals.subscribe(),
            cancel,
        )
    }

    /// The cached value subscribers would be replayed right now.
    ///
    /// Between a teardown and the next subscription this is the `initial`
    /// value given at construction, not whatever the upstream last
    /// produced. For a [`StateController`](crate::StateController) the
    /// cell's current state is [`state`](crate::StateController::state).
    pub fn value(&self) -> T {
        self.inner.life.lock().latest.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.life.lock().subscribers
    }

    /// The running upstream, if any.
    pub fn upstream_id(&self) -> Option<UpstreamId> {
        self.inner.life.lock().upstream.as_ref().map(|u| u.id)
    }

    /// `true` while the last subscriber has left but the grace timer has
    /// not fired yet.
    pub fn is_lingering(&self) -> bool {
        self.inner.life.lock().grace.is_some()
    }

    pub fn config(&self) -> &SharingConfig {
        &self.inner.config
    }
}

impl<T: Clone + Send + Sync + 'static> Shared<T> {
    /// Start a new upstream run. Called with the lifecycle lock held.
    fn start(this: &Arc<Self>, life: &mut Lifecycle<T>) -> UpstreamId {
        life.runs += 1;
        let id = UpstreamId(life.runs);
        let cancel = this.scope.token().child_token();
        let (signals, _) = broadcast::channel(this.config.channel_capacity());
        life.signals = signals;
        life.latest = this.initial.clone();

        let mut upstream = (this.producer)();
        // Prime the cache with whatever the upstream has ready right now so
        // the first subscriber is not replayed a stale initial value.
        let first = match upstream.next().now_or_never() {
            Some(Some(Ok(value))) => {
                life.latest = value;
                None
            }
            Some(item) => Some(item),
            None => None,
        };

        life.upstream = Some(Upstream {
            id,
            cancel: cancel.clone(),
        });
        info!(upstream = %id, "upstream started");

        this.scope
            .track(drive(Arc::downgrade(this), id, cancel, first, upstream));
        id
    }

    fn is_current(life: &Lifecycle<T>, id: UpstreamId) -> bool {
        life.upstream.as_ref().is_some_and(|u| u.id == id)
    }

    fn publish(&self, id: UpstreamId, value: T) {
        let mut life = self.life.lock();
        if !Self::is_current(&life, id) {
            return;
        }
        life.latest = value.clone();
        // Zero receivers while lingering in the grace period is expected.
        let _ = life.signals.send(Signal::Value(value));
    }

    fn fail(&self, id: UpstreamId, failure: Failure) {
        let mut life = self.life.lock();
        if !Self::is_current(&life, id) {
            return;
        }
        warn!(upstream = %id, error = %failure, "upstream failed; terminating subscribers");
        let _ = life.signals.send(Signal::Failed(failure));
        // Everyone attached now holds a terminated handle.
        life.subscribers = 0;
        self.stop(&mut life);
    }

    fn complete(&self, id: UpstreamId) {
        let life = self.life.lock();
        if Self::is_current(&life, id) {
            debug!(upstream = %id, "upstream completed; keeping cached value");
        }
    }

    /// The scope ended while run `id` was live.
    fn abandon(&self, id: UpstreamId) {
        let mut life = self.life.lock();
        if !Self::is_current(&life, id) {
            return;
        }
        // Every attached handle now reports `Cancelled`.
        life.subscribers = 0;
        self.stop(&mut life);
    }

    /// A subscription attached to run `id` went away.
    fn release(this: &Arc<Self>, id: UpstreamId) {
        let mut life = this.life.lock();
        if !Self::is_current(&life, id) {
            return;
        }
        life.subscribers = life.subscribers.saturating_sub(1);
        if life.subscribers > 0 || this.scope.is_cancelled() {
            return;
        }

        let grace = this.config.grace_period;
        if grace.is_zero() || tokio::runtime::Handle::try_current().is_err() {
            this.stop(&mut life);
            return;
        }

        let token = this.scope.token().child_token();
        if let Some(previous) = life.grace.replace(token.clone()) {
            previous.cancel();
        }
        debug!(upstream = %id, ?grace, "last subscriber left; shutdown scheduled");

        let weak = Arc::downgrade(this);
        this.scope.spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                () = tokio::time::sleep(grace) => {
                    if let Some(shared) = weak.upgrade() {
                        shared.expire(id, &token);
                    }
                }
            }
        });
    }

    fn expire(&self, id: UpstreamId, token: &CancellationToken) {
        let mut life = self.life.lock();
        if token.is_cancelled() || !Self::is_current(&life, id) || life.subscribers > 0 {
            return;
        }
        debug!(upstream = %id, "grace period elapsed");
        self.stop(&mut life);
    }

    /// Tear down the running upstream and reset the cache.
    fn stop(&self, life: &mut Lifecycle<T>) {
        if let Some(grace) = life.grace.take() {
            grace.cancel();
        }
        if let Some(upstream) = life.upstream.take() {
            upstream.cancel.cancel();
            info!(upstream = %upstream.id, "upstream stopped");
        }
        life.latest = self.initial.clone();
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        let life = self.life.get_mut();
        if let Some(grace) = life.grace.take() {
            grace.cancel();
        }
        if let Some(upstream) = life.upstream.take() {
            upstream.cancel.cancel();
        }
    }
}

/// Upstream task: forwards items until cancelled, failed or exhausted.
///
/// Holds only a weak reference so that dropping every handle to the stream
/// also ends production.
async fn drive<T: Clone + Send + Sync + 'static>(
    shared: Weak<Shared<T>>,
    id: UpstreamId,
    cancel: CancellationToken,
    mut pending: Option<Option<Result<T, Failure>>>,
    mut upstream: BoxStream<'static, Result<T, Failure>>,
) {
    loop {
        let item = match pending.take() {
            Some(item) => item,
            None => tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(upstream = %id, "upstream cancelled");
                    // A scope cancellation leaves this run current; a
                    // regular teardown has already cleared it.
                    if let Some(shared) = shared.upgrade() {
                        shared.abandon(id);
                    }
                    return;
                }
                item = upstream.next() => item,
            },
        };
        let Some(shared) = shared.upgrade() else {
            return;
        };
        match item {
            Some(Ok(value)) => shared.publish(id, value),
            Some(Err(failure)) => {
                shared.fail(id, failure);
                return;
            }
            None => {
                shared.complete(id);
                return;
            }
        }
    }
}
