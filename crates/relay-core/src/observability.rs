use serde::{Deserialize, Serialize};

/// Snapshot of an in-memory queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    /// Ready to be received.
    pub visible: usize,
    /// Handed out and not yet deleted or expired.
    pub in_flight: usize,
}

impl QueueCounts {
    pub fn total(&self) -> usize {
        self.visible + self.in_flight
    }
}
