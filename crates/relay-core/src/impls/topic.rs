//! NotificationTopic の実装
//!
//! - **RecordingTopic**: publish された通知を保持（テスト用）
//! - **LoggingTopic**: tracing に流すだけ（ローカル実行用）

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::ports::{NotificationTopic, PublishError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedNotification {
    pub subject: String,
    pub body: String,
}

#[derive(Clone, Default)]
pub struct RecordingTopic {
    published: Arc<Mutex<Vec<PublishedNotification>>>,
}

impl RecordingTopic {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn published(&self) -> Vec<PublishedNotification> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl NotificationTopic for RecordingTopic {
    async fn publish(&self, subject: &str, body: &str) -> Result<(), PublishError> {
        self.published.lock().await.push(PublishedNotification {
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoggingTopic;

#[async_trait]
impl NotificationTopic for LoggingTopic {
    async fn publish(&self, subject: &str, body: &str) -> Result<(), PublishError> {
        tracing::info!(subject, body, "notification published");
        Ok(())
    }
}
