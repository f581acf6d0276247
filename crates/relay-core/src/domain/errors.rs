//! Errors - エラー型と分類
//!
//! # 分類
//! - Transient: キュー/ストアに届かないなど一時的なもの。ack せず再配送に任せる
//! - Poison: 何度やっても処理できないメッセージ。dead-letter に送る

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::reference::StorageReference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transient,
    Poison,
}

/// Per-message failure. Caught at the message boundary by the coordinator.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("transport error during {operation}: {message}")]
    Transport { operation: &'static str, message: String },

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("unmappable key '{key}': {reason}")]
    UnmappableKey { key: String, reason: String },

    #[error("object not found: {0}")]
    ObjectNotFound(StorageReference),

    #[error("object unreadable: {reference}: {reason}")]
    ObjectUnreadable {
        reference: StorageReference,
        reason: String,
    },

    #[error("transform failed for {reference}: {reason}")]
    TransformError {
        reference: StorageReference,
        reason: String,
    },
}

impl PipelineError {
    pub fn transport(operation: &'static str, err: impl std::fmt::Display) -> Self {
        PipelineError::Transport {
            operation,
            message: err.to_string(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        PipelineError::MalformedEnvelope(reason.into())
    }

    /// Missing objects are treated as poison: there is no retry budget that
    /// would bring a deleted source back.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Transport { .. } => ErrorKind::Transient,
            PipelineError::MalformedEnvelope(_)
            | PipelineError::UnmappableKey { .. }
            | PipelineError::ObjectNotFound(_)
            | PipelineError::ObjectUnreadable { .. }
            | PipelineError::TransformError { .. } => ErrorKind::Poison,
        }
    }

    pub fn is_poison(&self) -> bool {
        self.kind() == ErrorKind::Poison
    }
}
