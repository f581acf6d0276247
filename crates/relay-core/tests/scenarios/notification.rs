//! Test: Notification - publish is best-effort

use std::sync::Arc;

use crate::helpers::*;
use relay_core::domain::Disposition;

#[tokio::test]
async fn test_publish_failure_still_acknowledges() {
    let h = Harness::new();
    h.put_source(KEY, CSV).await;
    h.queue.send(s3_event(KEY)).await;
    let coordinator = h.builder().with_topic(Arc::new(FailingTopic)).build().unwrap();

    let summary = coordinator.run_once().await.unwrap();

    assert_eq!((summary.succeeded, summary.failed), (1, 0));
    let outcome = &summary.outcomes[0];
    assert!(!outcome.notified);
    assert_eq!(outcome.disposition, Disposition::Acknowledged);
    assert!(h.target(TARGET_KEY).await.is_some());
    assert_eq!(h.queue.counts().await.total(), 0);
}

#[tokio::test]
async fn test_completion_event_names_target() {
    let h = Harness::new();
    h.put_source(KEY, CSV).await;
    h.queue.send(s3_event(KEY)).await;
    let coordinator = h.builder().build().unwrap();

    coordinator.run_once().await.unwrap();

    let published = h.topic.published().await;
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].subject, "Processed Crypto Data");
    assert_eq!(
        published[0].body,
        format!("Processed file saved to s3://{STORE}/{TARGET_KEY}")
    );
}
