//! State - メッセージ処理の状態
//!
//! # 状態遷移
//! RECEIVED → RESOLVED → FETCHED → TRANSFORMED → STORED → NOTIFIED → ACKNOWLEDGED
//!
//! どの状態からでも FAILED へ遷移できます（終端）。状態のスキップは不可。

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageState {
    Received,
    Resolved,
    Fetched,
    Transformed,
    Stored,
    Notified,
    Acknowledged,
    Failed,
}

impl MessageState {
    /// The only legal successor on the success path. Terminal states have none.
    pub fn next(self) -> Option<MessageState> {
        match self {
            MessageState::Received => Some(MessageState::Resolved),
            MessageState::Resolved => Some(MessageState::Fetched),
            MessageState::Fetched => Some(MessageState::Transformed),
            MessageState::Transformed => Some(MessageState::Stored),
            MessageState::Stored => Some(MessageState::Notified),
            MessageState::Notified => Some(MessageState::Acknowledged),
            MessageState::Acknowledged | MessageState::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, MessageState::Acknowledged | MessageState::Failed)
    }
}

impl fmt::Display for MessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageState::Received => "RECEIVED",
            MessageState::Resolved => "RESOLVED",
            MessageState::Fetched => "FETCHED",
            MessageState::Transformed => "TRANSFORMED",
            MessageState::Stored => "STORED",
            MessageState::Notified => "NOTIFIED",
            MessageState::Acknowledged => "ACKNOWLEDGED",
            MessageState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// What happened to the envelope on the queue side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Deleted after a successful run.
    Acknowledged,
    /// Written to the dead-letter sink, then deleted.
    DeadLettered,
    /// Not deleted; the queue will redeliver it after the visibility timeout.
    LeftForRedelivery,
}
