//! Outcome model: per-message results and the batch summary.
//!
//! A run never returns an error for a single bad message; it returns one
//! `MessageOutcome` per envelope and a count of each result.

use serde::{Deserialize, Serialize};

use super::errors::{ErrorKind, PipelineError};
use super::ids::MessageId;
use super::reference::StorageReference;
use super::state::{Disposition, MessageState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageOutcome {
    pub message_id: MessageId,

    /// `Acknowledged` or `Failed`.
    pub state: MessageState,

    /// Last state reached before failing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<MessageState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,

    pub disposition: Disposition,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<StorageReference>,

    /// False when the completion event could not be published.
    #[serde(default)]
    pub notified: bool,
}

impl MessageOutcome {
    pub fn acknowledged(message_id: MessageId, target: StorageReference, notified: bool) -> Self {
        Self {
            message_id,
            state: MessageState::Acknowledged,
            failed_at: None,
            error: None,
            error_kind: None,
            disposition: Disposition::Acknowledged,
            target: Some(target),
            notified,
        }
    }

    pub fn failed(
        message_id: MessageId,
        failed_at: MessageState,
        error: &PipelineError,
        disposition: Disposition,
    ) -> Self {
        Self {
            message_id,
            state: MessageState::Failed,
            failed_at: Some(failed_at),
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            disposition,
            target: None,
            notified: false,
        }
    }

    pub fn with_target(mut self, target: StorageReference) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_notified(mut self, notified: bool) -> Self {
        self.notified = notified;
        self
    }

    pub fn is_success(&self) -> bool {
        self.state == MessageState::Acknowledged
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,

    /// Subset of `failed` that went to the dead-letter sink.
    pub dead_lettered: usize,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outcomes: Vec<MessageOutcome>,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: Vec<MessageOutcome>) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let dead_lettered = outcomes
            .iter()
            .filter(|o| o.disposition == Disposition::DeadLettered)
            .count();
        Self {
            succeeded,
            failed: outcomes.len() - succeeded,
            dead_lettered,
            outcomes,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Fold another batch into this one (used when draining several batches).
    pub fn merge(&mut self, other: BatchSummary) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.dead_lettered += other.dead_lettered;
        self.outcomes.extend(other.outcomes);
    }
}
