// ── Data source boundary ──
//
// Upstream collaborators (preference stores, profile repositories) are
// reached only through this trait. Mutations stay as ordinary async
// methods on the concrete type and are wrapped by `update_with`.

use std::sync::Arc;

use futures_util::stream::BoxStream;

use crate::error::Failure;

/// A restartable, possibly infinite sequence of domain values.
///
/// Every call to [`observe`](Self::observe) must return a fresh sequence;
/// it is invoked again each time a shared stream restarts its upstream.
pub trait DataSource<T>: Send + Sync + 'static {
    fn observe(&self) -> BoxStream<'static, Result<T, Failure>>;
}

impl<T, S: DataSource<T> + ?Sized> DataSource<T> for Arc<S> {
    fn observe(&self) -> BoxStream<'static, Result<T, Failure>> {
        (**self).observe()
    }
}
