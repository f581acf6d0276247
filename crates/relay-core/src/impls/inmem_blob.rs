//! InMemoryBlobStore - テスト用のオブジェクトストア

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ContentType, StorageReference};
use crate::ports::{BlobError, BlobStore, StoredObject};

#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    objects: Arc<Mutex<HashMap<StorageReference, StoredObject>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(
        &self,
        reference: StorageReference,
        content: impl Into<Vec<u8>>,
        content_type: ContentType,
    ) {
        self.objects.lock().await.insert(
            reference,
            StoredObject {
                content: content.into(),
                content_type,
            },
        );
    }

    pub async fn object(&self, reference: &StorageReference) -> Option<StoredObject> {
        self.objects.lock().await.get(reference).cloned()
    }

    /// Ordered copy of every object, for comparing whole-store states.
    pub async fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.objects
            .lock()
            .await
            .iter()
            .map(|(reference, object)| (reference.to_string(), object.content.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, reference: &StorageReference) -> Result<StoredObject, BlobError> {
        self.objects
            .lock()
            .await
            .get(reference)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(reference.clone()))
    }

    async fn put(
        &self,
        reference: &StorageReference,
        content: &[u8],
        content_type: &ContentType,
    ) -> Result<(), BlobError> {
        self.objects.lock().await.insert(
            reference.clone(),
            StoredObject {
                content: content.to_vec(),
                content_type: content_type.clone(),
            },
        );
        Ok(())
    }
}
