// ── Async state snapshots ──
//
// Immutable value type; every transition consumes the old snapshot and
// returns the next one. The data baseline only moves on success.

use std::fmt;

use crate::error::Failure;
use crate::event::{IntoOneTimeEvent, OneTimeEvent};

/// Coarse classification of an [`AsyncState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Loading,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Failed => "failed",
        })
    }
}

/// A snapshot of some data plus the status of the last update applied to it.
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncState<T> {
    /// Last known good value.
    pub data: T,
    /// An update is in flight.
    pub loading: bool,
    /// Set only by the transition that recorded a failure.
    pub error: Option<OneTimeEvent<Failure>>,
}

impl<T> AsyncState<T> {
    /// `Idle(data)`.
    pub fn new(data: T) -> Self {
        Self {
            data,
            loading: false,
            error: None,
        }
    }

    /// `Loading(data)`, for controllers whose first frame waits on a source.
    pub fn loading(data: T) -> Self {
        Self {
            data,
            loading: true,
            error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Failed
        } else {
            Phase::Idle
        }
    }

    /// `Idle | Failed -> Loading`; data kept, error cleared.
    pub fn begin(self) -> Self {
        Self {
            data: self.data,
            loading: true,
            error: None,
        }
    }

    /// `Loading -> Idle(data)`.
    #[allow(clippy::unused_self)]
    pub fn succeed(self, data: T) -> Self {
        Self::new(data)
    }

    /// `Loading -> Failed`; data kept, failure wrapped in a fresh event.
    pub fn fail(self, failure: Failure) -> Self {
        self.fail_with(failure.into_one_time_event())
    }

    /// Like [`fail`](Self::fail) with a caller-built event (e.g. a scoped one).
    pub fn fail_with(self, event: OneTimeEvent<Failure>) -> Self {
        Self {
            data: self.data,
            loading: false,
            error: Some(event),
        }
    }

    /// Replace the data through a pure transform, keeping the status flags.
    pub fn map_data(self, f: impl FnOnce(&T) -> T) -> Self {
        Self {
            data: f(&self.data),
            loading: self.loading,
            error: self.error,
        }
    }

    /// The failure payload, if this snapshot carries one, without consuming it.
    pub fn failure(&self) -> Option<&Failure> {
        self.error.as_ref().map(OneTimeEvent::peek)
    }
}

impl<T: Default> Default for AsyncState<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Counter {
        count: u32,
    }

    #[test]
    fn initial_state_is_idle() {
        let state = AsyncState::new(Counter::default());
        assert_eq!(state.phase(), Phase::Idle);
        assert!(state.failure().is_none());
        assert_eq!(AsyncState::loading(Counter::default()).phase(), Phase::Loading);
    }

    #[test]
    fn success_advances_the_baseline() {
        let state = AsyncState::new(Counter { count: 0 }).begin();
        assert_eq!(state.phase(), Phase::Loading);
        assert_eq!(state.data.count, 0);

        let state = state.succeed(Counter { count: 1 });
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.data.count, 1);
    }

    #[test]
    fn failure_clears_loading_and_keeps_data() {
        let state = AsyncState::new(Counter { count: 1 })
            .begin()
            .fail(Failure::new("network"));
        assert_eq!(state.phase(), Phase::Failed);
        assert!(!state.loading);
        assert_eq!(state.data.count, 1);
        assert_eq!(state.failure().map(Failure::message), Some("network"));
    }

    #[test]
    fn begin_clears_previous_failure() {
        let state = AsyncState::new(Counter::default())
            .begin()
            .fail(Failure::new("timeout"))
            .begin();
        assert_eq!(state.phase(), Phase::Loading);
        assert!(state.error.is_none());
    }

    #[test]
    fn map_data_keeps_flags() {
        let state = AsyncState::loading(Counter { count: 2 }).map_data(|c| Counter {
            count: c.count * 10,
        });
        assert!(state.loading);
        assert_eq!(state.data.count, 20);
    }

    #[test]
    fn replayed_snapshot_delivers_error_once() {
        let failed = AsyncState::new(0u8).begin().fail(Failure::new("network"));
        let replay = failed.clone();
        let first = failed.error.as_ref().and_then(OneTimeEvent::consume);
        let second = replay.error.as_ref().and_then(OneTimeEvent::consume);
        assert_eq!(first.map(|f| f.message().to_owned()), Some("network".into()));
        assert!(second.is_none());
    }
}
