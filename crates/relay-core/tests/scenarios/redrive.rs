//! Test: Redrive - transient failures are retried a bounded number of times

use std::time::Duration;

use crate::helpers::*;
use relay_core::config::RelayConfig;
use relay_core::domain::{Disposition, ErrorKind};

#[tokio::test]
async fn test_transient_failure_is_dead_lettered_after_max_receives() {
    let h = Harness::with_visibility_timeout(Duration::ZERO);
    h.put_source(KEY, CSV).await;
    h.observed_store.fail_puts(true);
    h.queue.send(s3_event(KEY)).await;
    let coordinator = h
        .builder()
        .with_config(RelayConfig {
            max_receive_count: 3,
            ..RelayConfig::default()
        })
        .build()
        .unwrap();

    for attempt in 1..=2 {
        let summary = coordinator.run_once().await.unwrap();
        let outcome = &summary.outcomes[0];
        assert_eq!(outcome.error_kind, Some(ErrorKind::Transient), "attempt {attempt}");
        assert_eq!(outcome.disposition, Disposition::LeftForRedelivery);
    }

    let last = coordinator.run_once().await.unwrap();
    assert_eq!(last.dead_lettered, 1);
    assert_eq!(last.outcomes[0].disposition, Disposition::DeadLettered);

    let records = h.dead_letter.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].receive_count, 3);
    assert!(records[0].reason.starts_with("gave up after 3 deliveries"));
    assert_eq!(h.queue.counts().await.total(), 0);
}

#[tokio::test]
async fn test_ack_failure_after_store_is_not_redriven() {
    let h = Harness::with_visibility_timeout(Duration::ZERO);
    h.put_source(KEY, CSV).await;
    h.queue.send(s3_event(KEY)).await;
    h.observed_queue.fail_next_deletes(1);
    let coordinator = h
        .builder()
        .with_config(RelayConfig {
            max_receive_count: 1,
            ..RelayConfig::default()
        })
        .build()
        .unwrap();

    let summary = coordinator.run_once().await.unwrap();

    assert_eq!(summary.outcomes[0].disposition, Disposition::LeftForRedelivery);
    assert!(h.dead_letter.records().await.is_empty());
}
