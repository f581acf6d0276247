//! Test: Happy path - resolve, transform, store, notify, acknowledge

use crate::helpers::*;
use relay_core::app::{EnvelopeResolver, PartitionRemap};
use relay_core::config::RelayConfig;
use relay_core::domain::{MessageState, StorageReference};

#[test]
fn test_scenario_payload_maps_to_processed_key() {
    let payload = r#"{"Records":[{"s3":{"bucket":{"name":"b"},"object":{"key":"raw/x/2024/01/01/0101.csv"}}}]}"#;

    let reference = EnvelopeResolver::new().resolve(payload).unwrap();
    assert_eq!(reference, StorageReference::new("b", "raw/x/2024/01/01/0101.csv"));

    let target = PartitionRemap::new("raw", "processed")
        .target_key_for(reference.key())
        .unwrap();
    assert_eq!(target, "processed/x/2024/01/01/0101.csv");
}

#[tokio::test]
async fn test_direct_and_wrapped_payloads_both_process() {
    let h = Harness::new();
    h.put_source(KEY, CSV).await;
    h.queue.send(s3_event(KEY)).await;
    h.queue.send(wrapped(&s3_event(KEY))).await;
    let coordinator = h.builder().build().unwrap();

    let summary = coordinator.run_once().await.unwrap();

    assert_eq!((summary.succeeded, summary.failed), (2, 0));
    assert!(summary.outcomes.iter().all(|o| o.state == MessageState::Acknowledged));
    let output = String::from_utf8(h.target(TARGET_KEY).await.unwrap()).unwrap();
    assert_eq!(
        output,
        "name,price,source,partition_timestamp\n\
         Bitcoin,64000,x,2024-01-01T01:01:00Z\n\
         Ethereum,3100,x,2024-01-01T01:01:00Z\n"
    );
    assert_eq!(h.topic.published().await.len(), 2);
    assert_eq!(h.queue.counts().await.total(), 0);
}

#[tokio::test]
async fn test_empty_batch_returns_zero_counts() {
    let h = Harness::new();
    let coordinator = h.builder().build().unwrap();

    let summary = coordinator.run_once().await.unwrap();

    assert_eq!((summary.succeeded, summary.failed), (0, 0));
    assert!(summary.outcomes.is_empty());
    assert!(h.log.entries().is_empty());
}

#[tokio::test]
async fn test_missing_records_is_counted_not_raised() {
    let h = Harness::new();
    h.queue.send(r#"{"Event": "s3:TestEvent"}"#).await;
    let coordinator = h.builder().build().unwrap();

    let summary = coordinator.run_once().await.unwrap();

    assert_eq!((summary.succeeded, summary.failed), (0, 1));
    assert!(summary.outcomes[0]
        .error
        .as_deref()
        .unwrap()
        .starts_with("malformed envelope"));
}

#[tokio::test]
async fn test_drain_processes_every_batch() {
    let h = Harness::new();
    for n in 0..25 {
        h.put_source(&source_key(n), CSV).await;
        h.queue.send(s3_event(&source_key(n))).await;
    }
    let coordinator = h
        .builder()
        .with_config(RelayConfig::default())
        .build()
        .unwrap();

    let summary = coordinator.drain(None).await.unwrap();

    assert_eq!(summary.succeeded, 25);
    assert_eq!(h.store.len().await, 50);
    assert_eq!(h.queue.counts().await.total(), 0);
}
