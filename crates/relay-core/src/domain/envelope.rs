//! DeliveryEnvelope - キューからの 1 回分の配送
//!
//! envelope は「メッセージ」ではなく「配送」を表します。
//! 同じメッセージが再配送されると `receipt` は新しくなり、`receive_count` が増えます。

use serde::{Deserialize, Serialize};

use super::ids::{MessageId, ReceiptHandle};

/// One delivery of a queued message.
///
/// `id` is not an idempotency key on its own: acknowledging requires the
/// `receipt` of this exact delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryEnvelope {
    id: MessageId,
    payload: String,
    receipt: ReceiptHandle,
    receive_count: u32,
}

impl DeliveryEnvelope {
    pub fn new(id: MessageId, payload: impl Into<String>, receipt: ReceiptHandle) -> Self {
        Self {
            id,
            payload: payload.into(),
            receipt,
            receive_count: 1,
        }
    }

    /// Set how many times the queue has handed this message out (1 on first delivery).
    pub fn with_receive_count(mut self, receive_count: u32) -> Self {
        self.receive_count = receive_count.max(1);
        self
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn receipt(&self) -> ReceiptHandle {
        self.receipt
    }

    pub fn receive_count(&self) -> u32 {
        self.receive_count
    }
}
