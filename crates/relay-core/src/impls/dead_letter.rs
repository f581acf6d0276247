//! DeadLetterSink の実装
//!
//! - **InMemoryDeadLetterSink**: テスト用
//! - **JsonlDeadLetterSink**: 1 メッセージ 1 行の JSON Lines ファイルに追記

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::domain::{DeliveryEnvelope, MessageId};
use crate::ports::{Clock, DeadLetterError, DeadLetterSink, SystemClock};

/// What gets recorded for a poison message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetterRecord {
    pub message_id: MessageId,
    pub receive_count: u32,
    pub reason: String,
    pub payload: String,
    pub dead_lettered_at: DateTime<Utc>,
}

impl DeadLetterRecord {
    pub fn new(envelope: &DeliveryEnvelope, reason: &str, at: DateTime<Utc>) -> Self {
        Self {
            message_id: envelope.id(),
            receive_count: envelope.receive_count(),
            reason: reason.to_string(),
            payload: envelope.payload().to_string(),
            dead_lettered_at: at,
        }
    }
}

pub struct InMemoryDeadLetterSink<C = SystemClock> {
    records: Arc<Mutex<Vec<DeadLetterRecord>>>,
    clock: Arc<C>,
}

impl<C> Clone for InMemoryDeadLetterSink<C> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl Default for InMemoryDeadLetterSink<SystemClock> {
    fn default() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl InMemoryDeadLetterSink<SystemClock> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> InMemoryDeadLetterSink<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            clock: Arc::new(clock),
        }
    }

    pub async fn records(&self) -> Vec<DeadLetterRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl<C: Clock> DeadLetterSink for InMemoryDeadLetterSink<C> {
    async fn dead_letter(
        &self,
        envelope: &DeliveryEnvelope,
        reason: &str,
    ) -> Result<(), DeadLetterError> {
        let record = DeadLetterRecord::new(envelope, reason, self.clock.now());
        self.records.lock().await.push(record);
        Ok(())
    }
}

pub struct JsonlDeadLetterSink<C = SystemClock> {
    path: PathBuf,
    clock: C,
    // serializes appends from concurrent messages
    write_lock: Mutex<()>,
}

impl JsonlDeadLetterSink<SystemClock> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, SystemClock)
    }
}

impl<C: Clock> JsonlDeadLetterSink<C> {
    pub fn with_clock(path: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            path: path.into(),
            clock,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl<C: Clock> DeadLetterSink for JsonlDeadLetterSink<C> {
    async fn dead_letter(
        &self,
        envelope: &DeliveryEnvelope,
        reason: &str,
    ) -> Result<(), DeadLetterError> {
        let record = DeadLetterRecord::new(envelope, reason, self.clock.now());
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        // the record must be on disk before the message is deleted
        file.sync_all().await?;
        Ok(())
    }
}
