// ── Subscription handles ──
//
// A subscription yields its replay value first, then whatever the
// upstream publishes. Termination (upstream failure or scope cancellation)
// is sticky: every later `recv` returns the same error.

use std::sync::Arc;

use futures_core::Stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{Shared, Signal, UpstreamId};
use crate::config::Overflow;
use crate::error::CoreError;

/// An observer attached to a [`SharedStream`](super::SharedStream).
///
/// Dropping it unsubscribes; the last drop arms the stream's grace timer.
pub struct Subscription<T: Clone + Send + Sync + 'static> {
    shared: Option<Arc<Shared<T>>>,
    upstream: Option<UpstreamId>,
    replay: Option<T>,
    signals: Option<broadcast::Receiver<Signal<T>>>,
    cancel: CancellationToken,
    deferred: Option<CoreError>,
    terminal: Option<CoreError>,
}

impl<T: Clone + Send + Sync + 'static> Subscription<T> {
    pub(super) fn attached(
        shared: Arc<Shared<T>>,
        upstream: UpstreamId,
        replay: T,
        signals: broadcast::Receiver<Signal<T>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            shared: Some(shared),
            upstream: Some(upstream),
            replay: Some(replay),
            signals: Some(signals),
            cancel,
            deferred: None,
            terminal: None,
        }
    }

    /// A handle for a stream whose scope has already ended.
    pub(super) fn detached(cancel: CancellationToken) -> Self {
        Self {
            shared: None,
            upstream: None,
            replay: None,
            signals: None,
            cancel,
            deferred: None,
            terminal: Some(CoreError::Cancelled),
        }
    }

    /// The upstream run this subscription was attached to.
    pub fn upstream_id(&self) -> Option<UpstreamId> {
        self.upstream
    }

    pub fn is_terminated(&self) -> bool {
        self.terminal.is_some()
    }

    /// Wait for the next value.
    ///
    /// Returns the replay value on the first call. Once an error has been
    /// returned, every later call returns it again.
    pub async fn recv(&mut self) -> Result<T, CoreError> {
        if let Some(err) = &self.terminal {
            return Err(err.clone());
        }
        if self.cancel.is_cancelled() {
            return self.terminate(CoreError::Cancelled);
        }
        if let Some(err) = self.deferred.take() {
            return self.terminate(err);
        }
        if let Some(value) = self.replay.take() {
            return Ok(value);
        }

        let outcome = loop {
            let Some(signals) = self.signals.as_mut() else {
                break Err(CoreError::Cancelled);
            };
            let received = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break Err(CoreError::Cancelled),
                received = signals.recv() => received,
            };
            match received {
                Ok(Signal::Value(value)) => break Ok(self.conflate(value)),
                Ok(Signal::Failed(failure)) => break Err(CoreError::Upstream(failure)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber lagged; oldest updates dropped");
                }
                // The stream was torn down underneath this handle.
                Err(RecvError::Closed) => break Err(CoreError::Cancelled),
            }
        };

        match outcome {
            Ok(value) => Ok(value),
            Err(err) => self.terminate(err),
        }
    }

    /// Under [`Overflow::Conflate`], skip to the newest buffered value.
    fn conflate(&mut self, mut value: T) -> T {
        let conflating = self
            .shared
            .as_ref()
            .is_some_and(|s| s.config.overflow == Overflow::Conflate);
        if !conflating {
            return value;
        }
        let Some(signals) = self.signals.as_mut() else {
            return value;
        };
        loop {
            match signals.try_recv() {
                Ok(Signal::Value(newer)) => value = newer,
                Ok(Signal::Failed(failure)) => {
                    self.deferred = Some(CoreError::Upstream(failure));
                    return value;
                }
                Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => return value,
            }
        }
    }

    fn terminate(&mut self, err: CoreError) -> Result<T, CoreError> {
        self.signals = None;
        self.replay = None;
        self.terminal = Some(err.clone());
        Err(err)
    }

    /// Adapt into a `Stream` that ends after yielding the terminal error.
    pub fn into_stream(self) -> impl Stream<Item = Result<T, CoreError>> + Send + 'static {
        futures_util::stream::unfold(Some(self), |state| async move {
            let mut sub = state?;
            match sub.recv().await {
                Ok(value) => Some((Ok(value), Some(sub))),
                Err(err) => Some((Err(err), None)),
            }
        })
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let (Some(shared), Some(id)) = (self.shared.take(), self.upstream) {
            Shared::release(&shared, id);
        }
    }
}

impl<T: Clone + Send + Sync + 'static> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("upstream", &self.upstream)
            .field("terminal", &self.terminal)
            .finish_non_exhaustive()
    }
}
