//! CoordinatorBuilder - ポートと設定のワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開発体験の改善（明確なエラーメッセージ）

use std::sync::Arc;

use crate::config::{ConfigError, RelayConfig};
use crate::ports::{BlobStore, DeadLetterSink, DeliveryQueue, NotificationTopic};

use super::consumer::QueueConsumer;
use super::coordinator::PipelineCoordinator;
use super::resolver::EnvelopeResolver;
use super::transform::{PartitionRemap, TransformStage};

/// CoordinatorBuilder は PipelineCoordinator を構築
///
/// # 使用例
/// ```ignore
/// let coordinator = CoordinatorBuilder::new()
///     .with_queue(queue)
///     .with_blob_store(store)
///     .with_topic(topic)
///     .with_dead_letter(sink)
///     .with_config(config)
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - ポートが 1 つでも欠けていれば BuildError::MissingPort
/// - 設定は build() 時に validate() する
#[derive(Default)]
pub struct CoordinatorBuilder {
    queue: Option<Arc<dyn DeliveryQueue>>,
    blob_store: Option<Arc<dyn BlobStore>>,
    topic: Option<Arc<dyn NotificationTopic>>,
    dead_letter: Option<Arc<dyn DeadLetterSink>>,
    config: RelayConfig,
}

/// BuildError は構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing port: {0}. Every port must be supplied before build().")]
    MissingPort(&'static str),

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

impl CoordinatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue(mut self, queue: Arc<dyn DeliveryQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn with_blob_store(mut self, blob_store: Arc<dyn BlobStore>) -> Self {
        self.blob_store = Some(blob_store);
        self
    }

    pub fn with_topic(mut self, topic: Arc<dyn NotificationTopic>) -> Self {
        self.topic = Some(topic);
        self
    }

    pub fn with_dead_letter(mut self, dead_letter: Arc<dyn DeadLetterSink>) -> Self {
        self.dead_letter = Some(dead_letter);
        self
    }

    /// 未設定なら `RelayConfig::default()`
    pub fn with_config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<PipelineCoordinator, BuildError> {
        let queue = self.queue.ok_or(BuildError::MissingPort("queue"))?;
        let blob_store = self.blob_store.ok_or(BuildError::MissingPort("blob_store"))?;
        let topic = self.topic.ok_or(BuildError::MissingPort("topic"))?;
        let dead_letter = self.dead_letter.ok_or(BuildError::MissingPort("dead_letter"))?;

        let config = self.config;
        config.validate()?;

        let remap = PartitionRemap::new(&config.source_segment, &config.target_segment);
        Ok(PipelineCoordinator::new(
            EnvelopeResolver::new(),
            TransformStage::new(blob_store, remap),
            QueueConsumer::new(queue, config.max_messages, config.wait()),
            topic,
            dead_letter,
            config.notification_subject,
            config.max_receive_count,
            config.mode,
        ))
    }
}
