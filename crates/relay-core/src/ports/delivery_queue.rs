//! DeliveryQueue port - 配送キュー（SQS 互換 / InMemory）
//!
//! # 設計原則
//! - at-least-once: ack されなかった配送は visibility timeout 後に再配送される
//! - delete は「配送」単位（受領トークン）で行う。ID 単位ではない
//! - 空の receive はエラーではない（「今は仕事がない」）

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{DeliveryEnvelope, ReceiptHandle};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue unavailable: {0}")]
    Unavailable(String),

    /// The message was redelivered after this receipt was issued, or was
    /// already deleted.
    #[error("stale or unknown receipt: {0}")]
    StaleReceipt(ReceiptHandle),
}

#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    /// Receive up to `max_messages` envelopes, waiting at most `wait` for the
    /// first one. May return an empty vector.
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<DeliveryEnvelope>, QueueError>;

    /// Permanently remove this delivery. Irreversible.
    async fn delete(&self, envelope: &DeliveryEnvelope) -> Result<(), QueueError>;
}
