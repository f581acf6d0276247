//! Test: Failure isolation - one poison message never affects its siblings

use crate::helpers::*;
use relay_core::config::{ProcessingMode, RelayConfig};
use relay_core::domain::{Disposition, ErrorKind};
use rstest::rstest;

#[rstest]
#[case::sequential(ProcessingMode::Sequential)]
#[case::concurrent(ProcessingMode::Concurrent(3))]
#[tokio::test]
async fn test_poison_message_is_isolated(#[case] mode: ProcessingMode) {
    let h = Harness::new();
    let poison = 2;
    for n in 0..5 {
        if n == poison {
            h.queue.send("{\"Records\": []}").await;
        } else {
            h.put_source(&source_key(n), CSV).await;
            h.queue.send(s3_event(&source_key(n))).await;
        }
    }
    let coordinator = h
        .builder()
        .with_config(RelayConfig {
            mode,
            ..RelayConfig::default()
        })
        .build()
        .unwrap();

    let summary = coordinator.run_once().await.unwrap();

    assert_eq!((summary.succeeded, summary.failed, summary.dead_lettered), (4, 1, 1));
    for n in (0..5).filter(|n| *n != poison) {
        assert!(h.store.object(&target_of(&source_key(n))).await.is_some());
    }
    let failed: Vec<_> = summary.outcomes.iter().filter(|o| !o.is_success()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].error_kind, Some(ErrorKind::Poison));
    assert_eq!(failed[0].disposition, Disposition::DeadLettered);

    let records = h.dead_letter.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].payload, "{\"Records\": []}");
    assert_eq!(h.queue.counts().await.total(), 0);
}

#[tokio::test]
async fn test_missing_source_object_is_poison() {
    let h = Harness::new();
    h.put_source(&source_key(0), CSV).await;
    h.queue.send(s3_event(&source_key(0))).await;
    h.queue.send(s3_event("raw/gone/2024/01/01/0000.csv")).await;
    let coordinator = h.builder().build().unwrap();

    let summary = coordinator.run_once().await.unwrap();

    assert_eq!((summary.succeeded, summary.failed), (1, 1));
    assert!(h.dead_letter.records().await[0].reason.starts_with("object not found"));
}

#[tokio::test]
async fn test_dead_letter_failure_leaves_message_queued() {
    let h = Harness::new();
    h.queue.send("not json").await;
    let coordinator = h
        .builder()
        .with_dead_letter(std::sync::Arc::new(FailingDeadLetter))
        .build()
        .unwrap();

    let summary = coordinator.run_once().await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.dead_lettered, 0);
    assert_eq!(summary.outcomes[0].disposition, Disposition::LeftForRedelivery);
    assert_eq!(h.queue.counts().await.in_flight, 1);
    assert!(h.log.position("delete").is_none());
}
