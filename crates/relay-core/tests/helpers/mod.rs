//! Test utility functions for relay-core scenarios

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use relay_core::app::CoordinatorBuilder;
use relay_core::domain::{ContentType, DeliveryEnvelope, StorageReference};
use relay_core::impls::{InMemoryBlobStore, InMemoryDeadLetterSink, InMemoryDeliveryQueue, RecordingTopic};
use relay_core::ports::{
    BlobError, BlobStore, DeadLetterError, DeadLetterSink, DeliveryQueue, NotificationTopic,
    PublishError, QueueError, StoredObject,
};

pub const STORE: &str = "b";
pub const KEY: &str = "raw/x/2024/01/01/0101.csv";
pub const TARGET_KEY: &str = "processed/x/2024/01/01/0101.csv";
pub const CSV: &str = "name,price\nBitcoin,64000\nEthereum,3100\n";

/// Storage event delivered straight to the queue.
pub fn s3_event(key: &str) -> String {
    json!({"Records": [{"s3": {"bucket": {"name": STORE}, "object": {"key": key}}}]}).to_string()
}

/// Storage event wrapped in a topic notification.
pub fn wrapped(inner: &str) -> String {
    json!({"Type": "Notification", "Message": inner}).to_string()
}

pub fn source_key(n: usize) -> String {
    format!("raw/src{n}/2024/01/01/0101.csv")
}

pub fn target_of(key: &str) -> StorageReference {
    StorageReference::new(STORE, key.replace("raw/", "processed/"))
}

/// Side effects in the order they reached the ports.
#[derive(Clone, Default)]
pub struct OpLog(Arc<Mutex<Vec<String>>>);

impl OpLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.entries().iter().position(|e| e.starts_with(prefix))
    }
}

/// Queue wrapper that logs deletes and can fail the next N of them.
pub struct ObservedQueue {
    inner: Arc<InMemoryDeliveryQueue>,
    log: OpLog,
    failing_deletes: AtomicUsize,
}

impl ObservedQueue {
    pub fn fail_next_deletes(&self, n: usize) {
        self.failing_deletes.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeliveryQueue for ObservedQueue {
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<DeliveryEnvelope>, QueueError> {
        self.inner.receive(max_messages, wait).await
    }

    async fn delete(&self, envelope: &DeliveryEnvelope) -> Result<(), QueueError> {
        let remaining = self.failing_deletes.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_deletes.store(remaining - 1, Ordering::SeqCst);
            self.log.push("delete-failed");
            return Err(QueueError::Unavailable("injected delete failure".into()));
        }
        self.inner.delete(envelope).await?;
        self.log.push(format!("delete:{}", envelope.id()));
        Ok(())
    }
}

/// Blob store wrapper that logs puts and can refuse them.
pub struct ObservedStore {
    inner: InMemoryBlobStore,
    log: OpLog,
    fail_puts: AtomicBool,
}

impl ObservedStore {
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for ObservedStore {
    async fn get(&self, reference: &StorageReference) -> Result<StoredObject, BlobError> {
        self.inner.get(reference).await
    }

    async fn put(
        &self,
        reference: &StorageReference,
        content: &[u8],
        content_type: &ContentType,
    ) -> Result<(), BlobError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            self.log.push("put-failed");
            return Err(BlobError::Backend("injected put failure".into()));
        }
        self.inner.put(reference, content, content_type).await?;
        self.log.push(format!("put:{}", reference.key()));
        Ok(())
    }
}

pub struct FailingTopic;

#[async_trait]
impl NotificationTopic for FailingTopic {
    async fn publish(&self, _subject: &str, _body: &str) -> Result<(), PublishError> {
        Err(PublishError::Unavailable("topic is down".into()))
    }
}

pub struct FailingDeadLetter;

#[async_trait]
impl DeadLetterSink for FailingDeadLetter {
    async fn dead_letter(&self, _envelope: &DeliveryEnvelope, _reason: &str) -> Result<(), DeadLetterError> {
        Err(DeadLetterError::Unavailable("sink is down".into()))
    }
}

/// In-memory ports plus the wrappers above, wired together.
pub struct Harness {
    pub queue: Arc<InMemoryDeliveryQueue>,
    pub observed_queue: Arc<ObservedQueue>,
    pub store: InMemoryBlobStore,
    pub observed_store: Arc<ObservedStore>,
    pub topic: RecordingTopic,
    pub dead_letter: InMemoryDeadLetterSink,
    pub log: OpLog,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_visibility_timeout(Duration::from_secs(30))
    }

    /// `Duration::ZERO` makes unacknowledged messages visible again on the
    /// next receive.
    pub fn with_visibility_timeout(timeout: Duration) -> Self {
        let queue = Arc::new(InMemoryDeliveryQueue::new().with_visibility_timeout(timeout));
        let store = InMemoryBlobStore::new();
        let log = OpLog::default();
        Self {
            observed_queue: Arc::new(ObservedQueue {
                inner: queue.clone(),
                log: log.clone(),
                failing_deletes: AtomicUsize::new(0),
            }),
            observed_store: Arc::new(ObservedStore {
                inner: store.clone(),
                log: log.clone(),
                fail_puts: AtomicBool::new(false),
            }),
            queue,
            store,
            topic: RecordingTopic::new(),
            dead_letter: InMemoryDeadLetterSink::new(),
            log,
        }
    }

    /// Builder with every port wired; tests override what they need.
    pub fn builder(&self) -> CoordinatorBuilder {
        CoordinatorBuilder::new()
            .with_queue(self.observed_queue.clone())
            .with_blob_store(self.observed_store.clone())
            .with_topic(Arc::new(self.topic.clone()))
            .with_dead_letter(Arc::new(self.dead_letter.clone()))
    }

    pub async fn put_source(&self, key: &str, content: &str) {
        self.store
            .insert(StorageReference::new(STORE, key), content, ContentType::Csv)
            .await;
    }

    pub async fn target(&self, key: &str) -> Option<Vec<u8>> {
        self.store
            .object(&StorageReference::new(STORE, key))
            .await
            .map(|o| o.content)
    }
}
