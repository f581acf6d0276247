//! DeadLetterSink port - 処理不能メッセージの退避先
//!
//! poison メッセージはここに書き込んでから queue から delete します。
//! 書き込みに失敗した場合は delete せず、再配送に任せます。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::DeliveryEnvelope;

#[derive(Debug, Error)]
pub enum DeadLetterError {
    #[error("dead-letter sink unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    async fn dead_letter(&self, envelope: &DeliveryEnvelope, reason: &str)
    -> Result<(), DeadLetterError>;
}
