//! InMemoryDeliveryQueue - 開発・テスト用の配送キュー
//!
//! # 学習ポイント
//! - visibility timeout による暗黙の lease（ack されなければ再配送）
//! - 配送ごとに新しい受領トークンを発行し、古いトークンでの delete を拒否
//! - tokio::sync::Notify による待機付き receive
//! - tokio::time::Instant を使うので、テストでは時間を止めて進められる

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::domain::{DeliveryEnvelope, MessageId, ReceiptHandle};
use crate::observability::QueueCounts;
use crate::ports::{DeliveryQueue, IdGenerator, QueueError, SystemClock, UlidGenerator};

pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);

struct QueuedMessage {
    payload: String,
    receive_count: u32,
    /// Receipt of the current delivery, if the message is in flight.
    receipt: Option<ReceiptHandle>,
}

/// In-flight entry. Reverse ordering so BinaryHeap acts as a min-heap.
#[derive(Debug, Clone, PartialEq, Eq)]
struct InFlight {
    visible_at: Instant,
    message_id: MessageId,
    receipt: ReceiptHandle,
}

impl PartialOrd for InFlight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InFlight {
    fn cmp(&self, other: &Self) -> Ordering {
        other.visible_at.cmp(&self.visible_at)
    }
}

#[derive(Default)]
struct QueueState {
    messages: HashMap<MessageId, QueuedMessage>,
    visible: VecDeque<MessageId>,
    in_flight: BinaryHeap<InFlight>,
}

impl QueueState {
    /// Move deliveries whose visibility timeout elapsed back to the visible queue.
    ///
    /// Heap entries are not removed on delete; an entry only counts if its
    /// receipt still matches the message's current delivery.
    fn promote_expired(&mut self, now: Instant) {
        while let Some(entry) = self.in_flight.peek() {
            if entry.visible_at > now {
                break;
            }
            let Some(entry) = self.in_flight.pop() else {
                break;
            };
            if let Some(message) = self.messages.get_mut(&entry.message_id)
                && message.receipt == Some(entry.receipt)
            {
                message.receipt = None;
                self.visible.push_back(entry.message_id);
                tracing::debug!(message_id = %entry.message_id, "visibility timeout expired, message visible again");
            }
        }
    }

    fn next_expiry(&self) -> Option<Instant> {
        self.in_flight.peek().map(|entry| entry.visible_at)
    }

    fn counts(&self) -> QueueCounts {
        let in_flight = self
            .messages
            .values()
            .filter(|m| m.receipt.is_some())
            .count();
        QueueCounts {
            visible: self.messages.len() - in_flight,
            in_flight,
        }
    }
}

/// InMemoryDeliveryQueue は SQS と同じ受信/削除の契約を持つ開発用キュー
///
/// # 使用例
/// ```ignore
/// let queue = InMemoryDeliveryQueue::new();
/// queue.send(payload).await;
/// let batch = queue.receive(10, Duration::from_secs(1)).await?;
/// queue.delete(&batch[0]).await?;
/// ```
pub struct InMemoryDeliveryQueue {
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
    ids: Arc<dyn IdGenerator>,
    visibility_timeout: Duration,
}

impl InMemoryDeliveryQueue {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            notify: Arc::new(Notify::new()),
            ids: Arc::new(UlidGenerator::new(SystemClock)),
            visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
        }
    }

    pub fn with_visibility_timeout(mut self, visibility_timeout: Duration) -> Self {
        self.visibility_timeout = visibility_timeout;
        self
    }

    /// Enqueue a payload and wake one waiting receiver.
    pub async fn send(&self, payload: impl Into<String>) -> MessageId {
        let message_id = self.ids.generate_message_id();
        {
            let mut state = self.state.lock().await;
            state.messages.insert(
                message_id,
                QueuedMessage {
                    payload: payload.into(),
                    receive_count: 0,
                    receipt: None,
                },
            );
            state.visible.push_back(message_id);
        }
        self.notify.notify_one();
        message_id
    }

    pub async fn counts(&self) -> QueueCounts {
        let mut state = self.state.lock().await;
        state.promote_expired(Instant::now());
        state.counts()
    }

    fn take_visible(&self, state: &mut QueueState, max_messages: usize) -> Vec<DeliveryEnvelope> {
        let now = Instant::now();
        let mut batch = Vec::new();
        while batch.len() < max_messages {
            let Some(message_id) = state.visible.pop_front() else {
                break;
            };
            let Some(message) = state.messages.get_mut(&message_id) else {
                continue;
            };
            let receipt = self.ids.generate_receipt();
            message.receipt = Some(receipt);
            message.receive_count += 1;
            batch.push(
                DeliveryEnvelope::new(message_id, message.payload.clone(), receipt)
                    .with_receive_count(message.receive_count),
            );
            state.in_flight.push(InFlight {
                visible_at: now + self.visibility_timeout,
                message_id,
                receipt,
            });
        }
        batch
    }
}

impl Default for InMemoryDeliveryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryQueue for InMemoryDeliveryQueue {
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<DeliveryEnvelope>, QueueError> {
        if max_messages == 0 {
            return Ok(Vec::new());
        }
        let deadline = Instant::now() + wait;
        loop {
            let wake_at = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                state.promote_expired(now);

                let batch = self.take_visible(&mut state, max_messages);
                if !batch.is_empty() {
                    return Ok(batch);
                }
                if now >= deadline {
                    return Ok(Vec::new());
                }
                match state.next_expiry() {
                    Some(expiry) if expiry < deadline => expiry,
                    _ => deadline,
                }
            };

            tokio::select! {
                _ = self.notify.notified() => {},
                _ = tokio::time::sleep_until(wake_at) => {},
            }
        }
    }

    async fn delete(&self, envelope: &DeliveryEnvelope) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        let current = state.messages.get(&envelope.id()).and_then(|m| m.receipt);
        if current != Some(envelope.receipt()) {
            return Err(QueueError::StaleReceipt(envelope.receipt()));
        }
        state.messages.remove(&envelope.id());
        Ok(())
    }
}
