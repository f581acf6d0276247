//! Test: Redelivery - reprocessing the same message converges on the same state

use std::time::Duration;

use crate::helpers::*;
use relay_core::domain::{Disposition, MessageState};

#[tokio::test]
async fn test_redelivered_copy_produces_identical_store() {
    let h = Harness::new();
    h.put_source(KEY, CSV).await;
    let coordinator = h.builder().build().unwrap();

    h.queue.send(s3_event(KEY)).await;
    assert_eq!(coordinator.run_once().await.unwrap().succeeded, 1);
    let after_first = h.store.snapshot().await;

    // the queue delivers the same notification again
    h.queue.send(s3_event(KEY)).await;
    assert_eq!(coordinator.run_once().await.unwrap().succeeded, 1);
    let after_second = h.store.snapshot().await;

    assert_eq!(after_first, after_second);
    assert_eq!(h.topic.published().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unacknowledged_message_returns_after_visibility_timeout() {
    let h = Harness::new();
    h.put_source(KEY, CSV).await;
    h.observed_store.fail_puts(true);
    h.queue.send(s3_event(KEY)).await;
    let coordinator = h.builder().build().unwrap();

    let first = coordinator.run_once().await.unwrap();
    assert_eq!(first.outcomes[0].failed_at, Some(MessageState::Transformed));
    assert_eq!(first.outcomes[0].disposition, Disposition::LeftForRedelivery);

    // still leased
    assert!(coordinator.run_once().await.unwrap().is_empty());

    tokio::time::advance(Duration::from_secs(31)).await;
    h.observed_store.fail_puts(false);

    let second = coordinator.run_once().await.unwrap();
    assert_eq!(second.succeeded, 1);
    assert!(h.target(TARGET_KEY).await.is_some());
    assert_eq!(h.queue.counts().await.total(), 0);
}
