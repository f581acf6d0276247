//! Events - 完了通知
//!
//! 変換済みオブジェクトの書き込み完了を topic に知らせるイベント。
//! fire-and-forget（ack もリトライもしない）。

use serde::{Deserialize, Serialize};

use super::reference::StorageReference;

pub const DEFAULT_SUBJECT: &str = "Processed Crypto Data";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub subject: String,
    pub body: String,
    pub target: StorageReference,
}

impl CompletionEvent {
    pub fn new(subject: impl Into<String>, target: StorageReference) -> Self {
        Self {
            subject: subject.into(),
            body: format!("Processed file saved to {target}"),
            target,
        }
    }
}
