//! Shared async state container for screen controllers.
//!
//! A controller owns one mutable state cell, mutates it through a pair of
//! combinators, and exposes it to any number of observers through a hot,
//! replay-latest stream that survives brief observer absence:
//!
//! - **[`StateController`]** — Per-controller facade owning a [`Scope`], a
//!   [`StateCell`] and the [`SharedStream`] built on top of it. Dropping the
//!   controller cancels its scope.
//!
//! - **[`StateCell`]** — Serialized-writer cell holding an [`AsyncState`].
//!   [`update_state`](StateCell::update_state) applies pure transforms;
//!   [`update_with`](StateCell::update_with) publishes `Loading` synchronously,
//!   runs an async operation on the owning scope, then settles to `Idle` or
//!   `Failed`.
//!
//! - **[`SharedStream`]** — Multicasts one upstream production to every
//!   [`Subscription`]. The first subscriber starts the upstream; the last one
//!   leaving starts a grace timer after which the upstream is torn down.
//!
//! - **[`OneTimeEvent`]** — Payload wrapper whose [`consume`](OneTimeEvent::consume)
//!   delivers exactly once across every clone and replay. Failures stored in
//!   an [`AsyncState`] are wrapped in one so that resubscribing observers do
//!   not surface the same error twice.
//!
//! - **[`DataSource`]** — Boundary trait for restartable upstream sequences
//!   (preferences stores, remote profiles, etc.).

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod scope;
pub mod source;
pub mod state;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DEFAULT_BUFFER_CAPACITY, DEFAULT_GRACE_PERIOD, Overflow, SharingConfig};
pub use controller::StateController;
pub use error::{CoreError, Failure};
pub use event::{Consumption, OneTimeEvent};
pub use scope::Scope;
pub use source::DataSource;
pub use state::{AsyncState, Phase};
pub use store::StateCell;
pub use stream::{SharedStream, Subscription, UpstreamId};
