//! PipelineCoordinator - メッセージ単位のパイプライン実行
//!
//! # フロー（1 メッセージ）
//! 1. EnvelopeResolver でペイロード → StorageReference
//! 2. TransformStage::fetch でソース取得
//! 3. TransformStage::transform（純粋関数）
//! 4. TransformStage::store でターゲットキーに書き込み
//! 5. NotificationTopic に完了通知（best-effort）
//! 6. QueueConsumer::acknowledge で delete
//!
//! # 不変条件
//! - delete は必ず書き込み完了の後。逆順にはしない
//! - 1 メッセージの失敗が同じバッチの他メッセージに波及しない
//!
//! # 失敗時の扱い
//! - Poison: dead-letter に書いてから delete。dead-letter に失敗したら残す
//! - Transient: ack せず再配送に任せる。ただし受信回数が
//!   `max_receive_count` に達していたら dead-letter
//! - 通知失敗: warn ログのみ。ack して成功扱い（`notified = false`）
//! - 書き込み後の ack 失敗: 失敗扱い。再配送されても同じ内容で上書きされるだけ

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::instrument;

use crate::config::ProcessingMode;
use crate::domain::{
    BatchSummary, CompletionEvent, DeliveryEnvelope, Disposition, MessageOutcome, MessageState,
    PipelineError, StorageReference,
};
use crate::ports::{DeadLetterSink, NotificationTopic};

use super::consumer::QueueConsumer;
use super::resolver::EnvelopeResolver;
use super::transform::TransformStage;

pub const NO_MESSAGES_BODY: &str = "No messages in queue.";

/// Result of one trigger invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

/// Where a message got to, carried through the stages so a failure can
/// report its origin.
#[derive(Debug)]
struct Progress {
    state: MessageState,
    target: Option<StorageReference>,
    notified: bool,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: MessageState::Received,
            target: None,
            notified: false,
        }
    }

    fn advance(&mut self, to: MessageState) {
        debug_assert_eq!(self.state.next(), Some(to), "state skipped");
        tracing::debug!(from = %self.state, to = %to, "state transition");
        self.state = to;
    }
}

pub struct PipelineCoordinator {
    resolver: EnvelopeResolver,
    stage: TransformStage,
    consumer: QueueConsumer,
    topic: Arc<dyn NotificationTopic>,
    dead_letter: Arc<dyn DeadLetterSink>,
    subject: String,
    max_receive_count: u32,
    mode: ProcessingMode,
}

impl PipelineCoordinator {
    /// Use `CoordinatorBuilder` to wire ports and config.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        resolver: EnvelopeResolver,
        stage: TransformStage,
        consumer: QueueConsumer,
        topic: Arc<dyn NotificationTopic>,
        dead_letter: Arc<dyn DeadLetterSink>,
        subject: String,
        max_receive_count: u32,
        mode: ProcessingMode,
    ) -> Self {
        Self {
            resolver,
            stage,
            consumer,
            topic,
            dead_letter,
            subject,
            max_receive_count,
            mode,
        }
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    /// Run one envelope to a terminal state. Never returns an error; the
    /// failure is captured in the outcome.
    #[instrument(
        name = "message",
        skip_all,
        fields(message_id = %envelope.id(), receive_count = envelope.receive_count())
    )]
    pub async fn process(&self, envelope: &DeliveryEnvelope) -> MessageOutcome {
        let mut progress = Progress::new();
        match self.run_stages(envelope, &mut progress).await {
            Ok(target) => MessageOutcome::acknowledged(envelope.id(), target, progress.notified),
            Err(err) => self.fail(envelope, progress, err).await,
        }
    }

    async fn run_stages(
        &self,
        envelope: &DeliveryEnvelope,
        progress: &mut Progress,
    ) -> Result<StorageReference, PipelineError> {
        let reference = self.resolver.resolve(envelope.payload())?;
        progress.advance(MessageState::Resolved);

        let blob = self.stage.fetch(&reference).await?;
        progress.advance(MessageState::Fetched);

        let transformed = self.stage.transform(&blob)?;
        progress.advance(MessageState::Transformed);

        self.stage.store(&transformed).await?;
        progress.target = Some(transformed.reference.clone());
        progress.advance(MessageState::Stored);

        progress.notified = self.notify(&transformed.reference).await;
        progress.advance(MessageState::Notified);

        self.consumer.acknowledge(envelope).await?;
        progress.advance(MessageState::Acknowledged);

        tracing::debug!(source = %reference, output = %transformed.reference, rows = transformed.rows, "message processed");
        Ok(transformed.reference)
    }

    async fn notify(&self, target: &StorageReference) -> bool {
        let event = CompletionEvent::new(&self.subject, target.clone());
        match self.topic.publish(&event.subject, &event.body).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, output = %target, "completion notification failed");
                false
            }
        }
    }

    async fn fail(
        &self,
        envelope: &DeliveryEnvelope,
        progress: Progress,
        err: PipelineError,
    ) -> MessageOutcome {
        let failed_at = progress.state;
        let already_stored = progress.target.is_some();
        let exhausted = envelope.receive_count() >= self.max_receive_count;

        let reason = if err.is_poison() {
            Some(err.to_string())
        } else if exhausted && !already_stored {
            Some(format!(
                "gave up after {} deliveries: {err}",
                envelope.receive_count()
            ))
        } else {
            None
        };

        let disposition = match reason {
            Some(reason) => self.route_to_dead_letter(envelope, failed_at, &reason).await,
            None => {
                tracing::error!(state = %failed_at, error = %err, "message failed, left for redelivery");
                Disposition::LeftForRedelivery
            }
        };

        let outcome = MessageOutcome::failed(envelope.id(), failed_at, &err, disposition)
            .with_notified(progress.notified);
        match progress.target {
            Some(target) => outcome.with_target(target),
            None => outcome,
        }
    }

    /// Dead-letter first, then delete.
    async fn route_to_dead_letter(
        &self,
        envelope: &DeliveryEnvelope,
        failed_at: MessageState,
        reason: &str,
    ) -> Disposition {
        if let Err(e) = self.dead_letter.dead_letter(envelope, reason).await {
            tracing::error!(state = %failed_at, error = %e, reason, "dead-letter write failed, left for redelivery");
            return Disposition::LeftForRedelivery;
        }
        match self.consumer.acknowledge(envelope).await {
            Ok(()) => {
                tracing::warn!(state = %failed_at, reason, "message dead-lettered");
                Disposition::DeadLettered
            }
            Err(e) => {
                tracing::error!(state = %failed_at, error = %e, "dead-lettered message could not be deleted");
                Disposition::LeftForRedelivery
            }
        }
    }

    /// Process a batch. Every envelope gets an outcome.
    pub async fn run_batch(&self, batch: Vec<DeliveryEnvelope>) -> BatchSummary {
        let outcomes = match self.mode {
            ProcessingMode::Sequential => {
                let mut outcomes = Vec::with_capacity(batch.len());
                for envelope in &batch {
                    outcomes.push(self.process(envelope).await);
                }
                outcomes
            }
            ProcessingMode::Concurrent(limit) => {
                stream::iter(&batch)
                    .map(|envelope| self.process(envelope))
                    .buffer_unordered(limit.max(1))
                    .collect::<Vec<_>>()
                    .await
            }
        };

        let summary = BatchSummary::from_outcomes(outcomes);
        if !summary.is_empty() {
            tracing::info!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                dead_lettered = summary.dead_lettered,
                "batch processed"
            );
        }
        summary
    }

    /// Receive one batch and run it. Only a failed receive is an error.
    pub async fn run_once(&self) -> Result<BatchSummary, PipelineError> {
        let batch = self.consumer.receive_batch().await?;
        Ok(self.run_batch(batch).await)
    }

    /// Run batches until the queue returns an empty one, or `max_batches`
    /// have been run.
    pub async fn drain(&self, max_batches: Option<usize>) -> Result<BatchSummary, PipelineError> {
        let mut total = BatchSummary::default();
        let mut batches = 0;
        while max_batches.is_none_or(|max| batches < max) {
            let summary = self.run_once().await?;
            if summary.is_empty() {
                break;
            }
            batches += 1;
            total.merge(summary);
        }
        tracing::info!(
            batches,
            succeeded = total.succeeded,
            failed = total.failed,
            dead_lettered = total.dead_lettered,
            "queue drained"
        );
        Ok(total)
    }

    /// Trigger entry point. The event payload carries nothing the pipeline
    /// needs; it only signals that a batch should be run.
    pub async fn handle(&self, _event: serde_json::Value) -> Result<HandlerResponse, PipelineError> {
        let summary = self.run_once().await?;
        if summary.is_empty() {
            return Ok(HandlerResponse {
                status_code: 204,
                body: NO_MESSAGES_BODY.to_string(),
            });
        }
        Ok(HandlerResponse {
            status_code: 200,
            body: format!(
                "Processed {} messages: {} succeeded, {} failed ({} dead-lettered).",
                summary.total(),
                summary.succeeded,
                summary.failed,
                summary.dead_lettered
            ),
        })
    }
}
