//! QueueConsumer - 配送キューからのバッチ受信と ack
//!
//! ack（delete）は取り消せません。呼び出し側は出力の保存が完了してから
//! `acknowledge` を呼ぶこと。

use std::sync::Arc;
use std::time::Duration;

use crate::config::MAX_BATCH_SIZE;
use crate::domain::{DeliveryEnvelope, PipelineError};
use crate::ports::DeliveryQueue;

pub struct QueueConsumer {
    queue: Arc<dyn DeliveryQueue>,
    max_messages: usize,
    wait: Duration,
}

impl QueueConsumer {
    /// `max_messages` is clamped to `1..=MAX_BATCH_SIZE`.
    pub fn new(queue: Arc<dyn DeliveryQueue>, max_messages: usize, wait: Duration) -> Self {
        Self {
            queue,
            max_messages: max_messages.clamp(1, MAX_BATCH_SIZE),
            wait,
        }
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Receive one batch. Empty is a normal result.
    pub async fn receive_batch(&self) -> Result<Vec<DeliveryEnvelope>, PipelineError> {
        let batch = self
            .queue
            .receive(self.max_messages, self.wait)
            .await
            .map_err(|e| PipelineError::transport("receive", e))?;
        tracing::debug!(count = batch.len(), "received batch");
        Ok(batch)
    }

    pub async fn acknowledge(&self, envelope: &DeliveryEnvelope) -> Result<(), PipelineError> {
        self.queue
            .delete(envelope)
            .await
            .map_err(|e| PipelineError::transport("delete", e))?;
        tracing::debug!(message_id = %envelope.id(), "acknowledged");
        Ok(())
    }
}
