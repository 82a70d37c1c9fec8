// ── One-time events ──
//
// Observers are handed the latest cached snapshot every time they
// (re)subscribe, so anything that must happen once per occurrence (an
// error banner, a navigation) is wrapped here. All clones share one flag.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// Outcome of [`OneTimeEvent::try_consume`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consumption<T> {
    /// This call won the race; the payload is delivered.
    Delivered(T),
    /// Another call (on this event or any clone of it) already took it.
    AlreadyConsumed,
    /// The scope that produced the event has ended.
    Cancelled,
}

impl<T> Consumption<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Delivered(value) => Some(value),
            Self::AlreadyConsumed | Self::Cancelled => None,
        }
    }
}

/// A payload delivered to at most one successful [`consume`](Self::consume).
pub struct OneTimeEvent<T> {
    inner: Arc<EventInner<T>>,
}

struct EventInner<T> {
    value: T,
    consumed: AtomicBool,
    scope: Option<CancellationToken>,
}

impl<T> OneTimeEvent<T> {
    pub fn new(value: T) -> Self {
        Self::build(value, None)
    }

    /// An event that stops delivering once `scope` is cancelled.
    pub fn scoped(value: T, scope: CancellationToken) -> Self {
        Self::build(value, Some(scope))
    }

    fn build(value: T, scope: Option<CancellationToken>) -> Self {
        Self {
            inner: Arc::new(EventInner {
                value,
                consumed: AtomicBool::new(false),
                scope,
            }),
        }
    }

    /// Read the payload without consuming it.
    pub fn peek(&self) -> &T {
        &self.inner.value
    }

    pub fn is_consumed(&self) -> bool {
        self.inner.consumed.load(Ordering::Acquire)
    }

    /// `true` if both handles refer to the same occurrence.
    pub fn same_event(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> OneTimeEvent<T> {
    /// Take the payload if nobody has yet.
    ///
    /// The flag flips with a single atomic swap, so concurrent callers can
    /// never both observe `false`.
    pub fn try_consume(&self) -> Consumption<T> {
        if self
            .inner
            .scope
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            return Consumption::Cancelled;
        }
        if self.inner.consumed.swap(true, Ordering::AcqRel) {
            Consumption::AlreadyConsumed
        } else {
            Consumption::Delivered(self.inner.value.clone())
        }
    }

    /// [`try_consume`](Self::try_consume) collapsed to an `Option`.
    pub fn consume(&self) -> Option<T> {
        self.try_consume().into_option()
    }
}

impl<T> Clone for OneTimeEvent<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Events are compared by identity: two separate failures with the same
/// payload are two occurrences.
impl<T> PartialEq for OneTimeEvent<T> {
    fn eq(&self, other: &Self) -> bool {
        self.same_event(other)
    }
}

impl<T> Eq for OneTimeEvent<T> {}

impl<T: fmt::Debug> fmt::Debug for OneTimeEvent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneTimeEvent")
            .field("value", &self.inner.value)
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

/// Shorthand for wrapping a payload.
pub trait IntoOneTimeEvent: Sized {
    fn into_one_time_event(self) -> OneTimeEvent<Self>;
}

impl<T> IntoOneTimeEvent for T {
    fn into_one_time_event(self) -> OneTimeEvent<Self> {
        OneTimeEvent::new(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Barrier;
    use std::sync::atomic::AtomicUsize;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn consume_delivers_once() {
        let event = OneTimeEvent::new("network");
        assert_eq!(event.consume(), Some("network"));
        assert_eq!(event.consume(), None);
        assert!(event.is_consumed());
    }

    #[test]
    fn clones_share_the_flag() {
        let event = OneTimeEvent::new(7);
        let replay = event.clone();
        assert_eq!(replay.consume(), Some(7));
        assert_eq!(event.try_consume(), Consumption::AlreadyConsumed);
        assert!(event.same_event(&replay));
    }

    #[test]
    fn peek_does_not_consume() {
        let event = 'x'.into_one_time_event();
        assert_eq!(*event.peek(), 'x');
        assert!(!event.is_consumed());
        assert_eq!(event.consume(), Some('x'));
    }

    #[test]
    fn separate_events_are_not_equal() {
        assert_ne!(OneTimeEvent::new(1), OneTimeEvent::new(1));
    }

    #[test]
    fn cancelled_scope_stops_delivery() {
        let token = CancellationToken::new();
        let event = OneTimeEvent::scoped("late", token.clone());
        token.cancel();
        assert_eq!(event.try_consume(), Consumption::Cancelled);
        assert_eq!(event.consume(), None);
        assert!(!event.is_consumed());
    }

    fn race(consumers: usize) -> usize {
        let event = OneTimeEvent::new(42u32);
        let delivered = AtomicUsize::new(0);
        let barrier = Barrier::new(consumers);
        std::thread::scope(|s| {
            for _ in 0..consumers {
                s.spawn(|| {
                    let local = event.clone();
                    barrier.wait();
                    if local.consume() == Some(42) {
                        delivered.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });
        delivered.load(Ordering::Relaxed)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn concurrent_consumers_see_exactly_one_delivery(consumers in 1usize..24) {
            prop_assert_eq!(race(consumers), 1);
        }
    }
}
