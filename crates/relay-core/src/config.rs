//! Relay configuration (TOML).
//!
//! Every field has a default, so an empty file is a valid configuration.
//!
//! ```toml
//! store = "market-data"
//! max_messages = 10
//! wait_seconds = 0
//! visibility_timeout_secs = 30
//! max_receive_count = 5
//! source_segment = "raw"
//! target_segment = "processed"
//! notification_subject = "Processed Crypto Data"
//! mode = { concurrent = 4 }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DEFAULT_SUBJECT;

/// Upper bound the queue accepts for a single receive.
pub const MAX_BATCH_SIZE: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    #[default]
    Sequential,
    /// Up to N messages of one batch in flight at once.
    Concurrent(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Store (bucket) `relay transform` files its input under. Pipeline runs
    /// ignore it; every payload names its own bucket.
    pub store: String,
    pub max_messages: usize,
    pub wait_seconds: u64,
    /// Must be at least 1. With 0 an unacknowledged message is visible again
    /// within the same drain, and a delete that keeps failing after the
    /// output is stored would never let the queue empty.
    pub visibility_timeout_secs: u64,
    /// Deliveries after which a transiently failing message is dead-lettered.
    pub max_receive_count: u32,
    pub source_segment: String,
    pub target_segment: String,
    pub notification_subject: String,
    pub mode: ProcessingMode,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            store: "market-data".to_string(),
            max_messages: MAX_BATCH_SIZE,
            wait_seconds: 0,
            visibility_timeout_secs: 30,
            max_receive_count: 5,
            source_segment: "raw".to_string(),
            target_segment: "processed".to_string(),
            notification_subject: DEFAULT_SUBJECT.to_string(),
            mode: ProcessingMode::Sequential,
        }
    }
}

impl RelayConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: RelayConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_BATCH_SIZE).contains(&self.max_messages) {
            return Err(ConfigError::Invalid(format!(
                "max_messages must be between 1 and {MAX_BATCH_SIZE}, got {}",
                self.max_messages
            )));
        }
        if self.visibility_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "visibility_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.max_receive_count == 0 {
            return Err(ConfigError::Invalid(
                "max_receive_count must be at least 1".to_string(),
            ));
        }
        for (name, segment) in [
            ("source_segment", &self.source_segment),
            ("target_segment", &self.target_segment),
        ] {
            if segment.is_empty() || segment.contains('/') {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a single non-empty path segment, got '{segment}'"
                )));
            }
        }
        if self.source_segment == self.target_segment {
            return Err(ConfigError::Invalid(
                "source_segment and target_segment must differ".to_string(),
            ));
        }
        if let ProcessingMode::Concurrent(0) = self.mode {
            return Err(ConfigError::Invalid(
                "concurrent mode needs a limit of at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_seconds)
    }

    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }
}
