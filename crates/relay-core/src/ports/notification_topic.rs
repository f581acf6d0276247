//! NotificationTopic port - 完了通知の fan-out 先（SNS 互換）
//!
//! best-effort。配送確認はパイプライン側で消費しない。

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("topic unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait NotificationTopic: Send + Sync {
    async fn publish(&self, subject: &str, body: &str) -> Result<(), PublishError>;
}
