#![allow(clippy::unwrap_used)]
// Integration tests for `StateController`: combinators observed through
// the shared stream, one-time failure delivery and scope teardown.

use std::time::Duration;

use futures_util::stream::{BoxStream, StreamExt};
use pretty_assertions::assert_eq;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use hotstate_core::{
    AsyncState, CoreError, DataSource, Failure, Phase, Scope, SharingConfig, StateController,
};

// ── Helpers ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct Counter {
    count: u32,
}

fn counter(count: u32) -> StateController<Counter> {
    StateController::new(AsyncState::new(Counter { count }), SharingConfig::default())
}

fn summary(state: &AsyncState<Counter>) -> (Phase, u32) {
    (state.phase(), state.data.count)
}

/// A preferences-like source backed by a watch channel.
struct Watched(watch::Receiver<u32>);

impl DataSource<u32> for Watched {
    fn observe(&self) -> BoxStream<'static, Result<u32, Failure>> {
        WatchStream::new(self.0.clone()).map(Ok).boxed()
    }
}

// ── Combinator tests ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_update_before_subscribe_is_observed_as_loading() {
    let controller = counter(0);
    let handle = controller.update_with(|c| async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(Counter { count: c.count + 1 })
    });

    let mut sub = controller.subscribe();
    assert_eq!(summary(&sub.recv().await.unwrap()), (Phase::Loading, 0));
    assert_eq!(summary(&sub.recv().await.unwrap()), (Phase::Idle, 1));
    assert_eq!(handle.await.unwrap(), Some(()));
}

#[tokio::test]
async fn test_every_subscriber_sees_same_sequence() {
    let controller = counter(0);
    let mut first = controller.subscribe();
    let mut second = controller.subscribe();

    controller.update_state(|c| Counter { count: c.count + 1 });
    controller
        .update_with(|c| async move { Ok(Counter { count: c.count * 10 }) })
        .await
        .unwrap();

    let expected = vec![
        (Phase::Idle, 0),
        (Phase::Idle, 1),
        (Phase::Loading, 1),
        (Phase::Idle, 10),
    ];
    let mut seen_first = Vec::new();
    let mut seen_second = Vec::new();
    for _ in 0..expected.len() {
        seen_first.push(summary(&first.recv().await.unwrap()));
        seen_second.push(summary(&second.recv().await.unwrap()));
    }
    assert_eq!(seen_first, expected);
    assert_eq!(seen_second, expected);
    assert_eq!(first.upstream_id(), second.upstream_id());
}

#[tokio::test]
async fn test_failure_is_consumed_once_across_subscribers() {
    let controller = counter(1);
    let mut sub = controller.subscribe();
    controller
        .update_with(|_| async { Err(Failure::new("network")) })
        .await
        .unwrap();

    assert_eq!(summary(&sub.recv().await.unwrap()), (Phase::Idle, 1));
    assert_eq!(summary(&sub.recv().await.unwrap()), (Phase::Loading, 1));
    let failed = sub.recv().await.unwrap();
    assert_eq!(summary(&failed), (Phase::Failed, 1));
    assert_eq!(
        failed.error.as_ref().unwrap().consume().unwrap().message(),
        "network"
    );

    // A second observer is replayed the same failure, already spent.
    let mut late = controller.subscribe();
    let replayed = late.recv().await.unwrap();
    assert_eq!(replayed.phase(), Phase::Failed);
    assert!(replayed.error.unwrap().consume().is_none());
}

#[tokio::test]
async fn test_run_with_failure_keeps_data() {
    let controller = counter(4);
    controller
        .run_with(|_| async { Err(Failure::new("sign out rejected")) })
        .await
        .unwrap();

    let state = controller.state();
    assert_eq!(summary(&state), (Phase::Failed, 4));
    assert_eq!(state.failure().unwrap().message(), "sign out rejected");
}

// ── Data source tests ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_observing_restarts_source_after_teardown() {
    let (tx, rx) = watch::channel(1);
    let config = SharingConfig::default().with_grace_period(Duration::from_secs(1));
    let controller =
        StateController::observing(Scope::new(), AsyncState::loading(0), Watched(rx), config);

    let mut sub = controller.subscribe();
    assert_eq!(sub.recv().await.unwrap().phase(), Phase::Loading);
    assert_eq!(sub.recv().await.unwrap().data, 1);
    drop(sub);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(controller.stream().upstream_id(), None);

    // Changes made while nobody observes are picked up on restart.
    tx.send(2).unwrap();
    let mut sub = controller.subscribe();
    let mut latest = sub.recv().await.unwrap();
    while latest.data != 2 {
        latest = sub.recv().await.unwrap();
    }
    assert_eq!(latest.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_stream_cache_resets_while_cell_keeps_state() {
    let config = SharingConfig::default().with_grace_period(Duration::from_secs(1));
    let controller = StateController::new(AsyncState::new(Counter { count: 0 }), config);
    controller.update_state(|c| Counter { count: c.count + 5 });

    let mut sub = controller.subscribe();
    assert_eq!(summary(&sub.recv().await.unwrap()), (Phase::Idle, 5));
    drop(sub);
    tokio::time::sleep(Duration::from_secs(2)).await;

    // The stream cache falls back to the construction value; the cell does not.
    assert_eq!(controller.stream().value().data.count, 0);
    assert_eq!(controller.state().data.count, 5);

    let mut sub = controller.subscribe();
    assert_eq!(summary(&sub.recv().await.unwrap()), (Phase::Idle, 5));
}

#[tokio::test]
async fn test_update_with_on_observed_controller() {
    let (_tx, rx) = watch::channel(3);
    let controller = StateController::observing(
        Scope::new(),
        AsyncState::new(0),
        Watched(rx),
        SharingConfig::default(),
    );
    let mut sub = controller.subscribe();
    assert_eq!(sub.recv().await.unwrap().data, 0);
    assert_eq!(sub.recv().await.unwrap().data, 3);

    controller
        .update_with(|n| async move { Ok(n + 1) })
        .await
        .unwrap();
    assert_eq!(sub.recv().await.unwrap().phase(), Phase::Loading);
    let done = sub.recv().await.unwrap();
    assert_eq!((done.phase(), done.data), (Phase::Idle, 4));
}

// ── Scope tests ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_work_and_subscribers() {
    let controller = counter(0);
    let mut sub = controller.subscribe();
    assert_eq!(sub.recv().await.unwrap().data.count, 0);

    let pending = controller.update_with(|_| async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Counter { count: 1 })
    });
    controller.shutdown().await;

    assert_eq!(pending.await.unwrap(), None);
    assert_eq!(controller.scope().active_tasks(), 0);
    assert_eq!(controller.stream().upstream_id(), None);
    let mut rest = Vec::new();
    let mut stream = Box::pin(sub.into_stream());
    while let Some(item) = stream.next().await {
        rest.push(item.map(|s| summary(&s)));
    }
    assert_eq!(rest.last(), Some(&Err(CoreError::Cancelled)));
    assert!(controller.subscribe().is_terminated());
}

#[tokio::test]
async fn test_update_after_shutdown_is_ignored() {
    let controller = counter(2);
    controller.shutdown().await;

    let handle = controller.update_with(|c| async move { Ok(Counter { count: c.count * 10 }) });
    assert_eq!(handle.await.unwrap(), None);
    assert_eq!(summary(&controller.state()), (Phase::Idle, 2));
}

#[tokio::test]
async fn test_child_scope_ends_with_parent() {
    let parent = Scope::new();
    let controller = StateController::with_scope(
        parent.child(),
        AsyncState::new(Counter { count: 0 }),
        SharingConfig::default(),
    );
    let mut sub = controller.subscribe();
    assert_eq!(sub.recv().await.unwrap().data.count, 0);

    parent.cancel();
    assert_eq!(sub.recv().await, Err(CoreError::Cancelled));
}
