//! Storage references and the blobs they point at.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one object in a partitioned blob store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageReference {
    store: String,
    key: String,
}

impl StorageReference {
    pub fn new(store: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            key: key.into(),
        }
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Same store, different key.
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self::new(self.store.clone(), key)
    }
}

impl fmt::Display for StorageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.store, self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Csv,
    Json,
    OctetStream,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Csv => "text/csv",
            ContentType::Json => "application/json",
            ContentType::OctetStream => "application/octet-stream",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw object fetched from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub reference: StorageReference,
    pub content: Vec<u8>,
    pub content_type: ContentType,
}

/// Output of the transform stage, addressed to its target key.
///
/// The same source key always maps to the same `reference`, and the content
/// depends only on the source blob, so writing it again is an overwrite with
/// identical bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedBlob {
    pub reference: StorageReference,
    pub content: Vec<u8>,
    pub content_type: ContentType,
    pub rows: usize,
}
