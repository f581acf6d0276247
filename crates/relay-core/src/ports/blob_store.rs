//! BlobStore port - 日付パーティションのオブジェクトストレージ（S3/Local/InMemory）
//!
//! # 設計原則
//! - 同じ key への get-after-put は一貫している
//! - put は無条件に上書き（楽観ロックなし）
//! - put が Ok を返したら内容は永続化済み（この後にキューの delete が続く）
//! - 取得から変換までの間にソースが変わる可能性は許容する

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ContentType, StorageReference};

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(StorageReference),

    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Bytes plus the content type recorded at write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content: Vec<u8>,
    pub content_type: ContentType,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, reference: &StorageReference) -> Result<StoredObject, BlobError>;

    async fn put(
        &self,
        reference: &StorageReference,
        content: &[u8],
        content_type: &ContentType,
    ) -> Result<(), BlobError>;
}
