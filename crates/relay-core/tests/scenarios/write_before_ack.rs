//! Test: Write before ack - the queue delete never precedes the durable write

use std::time::Duration;

use crate::helpers::*;
use relay_core::domain::{Disposition, MessageState};

#[tokio::test]
async fn test_put_is_logged_before_delete() {
    let h = Harness::new();
    h.put_source(KEY, CSV).await;
    h.queue.send(s3_event(KEY)).await;
    let coordinator = h.builder().build().unwrap();

    coordinator.run_once().await.unwrap();

    let put = h.log.position(&format!("put:{TARGET_KEY}")).unwrap();
    let delete = h.log.position("delete:").unwrap();
    assert!(put < delete, "{:?}", h.log.entries());
}

#[tokio::test]
async fn test_failed_write_is_never_acknowledged() {
    let h = Harness::with_visibility_timeout(Duration::ZERO);
    h.put_source(KEY, CSV).await;
    h.observed_store.fail_puts(true);
    h.queue.send(s3_event(KEY)).await;
    let coordinator = h.builder().build().unwrap();

    let summary = coordinator.run_once().await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.outcomes[0].failed_at, Some(MessageState::Transformed));
    assert_eq!(h.log.entries(), vec!["put-failed".to_string()]);
    assert!(h.topic.published().await.is_empty());
    assert_eq!(h.queue.counts().await.visible, 1);
}

#[tokio::test]
async fn test_fault_between_write_and_ack_is_reprocessed_safely() {
    let h = Harness::with_visibility_timeout(Duration::ZERO);
    h.put_source(KEY, CSV).await;
    h.queue.send(s3_event(KEY)).await;
    h.observed_queue.fail_next_deletes(1);
    let coordinator = h.builder().build().unwrap();

    let first = coordinator.run_once().await.unwrap();
    let outcome = &first.outcomes[0];
    assert_eq!(outcome.failed_at, Some(MessageState::Notified));
    assert_eq!(outcome.disposition, Disposition::LeftForRedelivery);
    assert_eq!(outcome.target, Some(target_of(KEY)));
    let written = h.target(TARGET_KEY).await.unwrap();

    let second = coordinator.run_once().await.unwrap();
    assert_eq!(second.succeeded, 1);
    assert_eq!(second.outcomes[0].message_id, outcome.message_id);
    assert_eq!(h.target(TARGET_KEY).await.unwrap(), written);
    assert_eq!(h.queue.counts().await.total(), 0);
    assert!(h.dead_letter.records().await.is_empty());
}
