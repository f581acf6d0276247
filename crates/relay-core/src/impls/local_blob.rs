//! LocalBlobStore - ローカルファイルシステム上のオブジェクトストア
//!
//! `<root>/<store>/<key>` にそのまま保存します。put は一時ファイルに書いて
//! fsync してから rename するので、読み手が書きかけのファイルを見ることはなく、
//! put が返った時点で内容はディスクに届いています。

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::domain::{ContentType, StorageReference};
use crate::ports::{BlobError, BlobStore, StoredObject};

#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a reference to a path under the root, rejecting anything that
    /// could escape it.
    pub fn path_for(&self, reference: &StorageReference) -> Result<PathBuf, BlobError> {
        let mut path = self.root.clone();
        for (part, what) in [(reference.store(), "store"), (reference.key(), "key")] {
            if part.is_empty() {
                return Err(BlobError::InvalidKey {
                    key: reference.key().to_string(),
                    reason: format!("empty {what}"),
                });
            }
            for component in Path::new(part).components() {
                match component {
                    Component::Normal(segment) => path.push(segment),
                    _ => {
                        return Err(BlobError::InvalidKey {
                            key: reference.key().to_string(),
                            reason: format!("{what} must be a relative path without '..'"),
                        });
                    }
                }
            }
        }
        Ok(path)
    }
}

fn content_type_for(path: &Path) -> ContentType {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => ContentType::Csv,
        Some(ext) if ext.eq_ignore_ascii_case("json") => ContentType::Json,
        _ => ContentType::OctetStream,
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn get(&self, reference: &StorageReference) -> Result<StoredObject, BlobError> {
        let path = self.path_for(reference)?;
        match tokio::fs::read(&path).await {
            Ok(content) => Ok(StoredObject {
                content,
                content_type: content_type_for(&path),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BlobError::NotFound(reference.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put(
        &self,
        reference: &StorageReference,
        content: &[u8],
        _content_type: &ContentType,
    ) -> Result<(), BlobError> {
        let path = self.path_for(reference)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut tmp = path.clone().into_os_string();
        tmp.push(format!(".{}.tmp", ulid::Ulid::new()));
        let tmp = PathBuf::from(tmp);

        let written = match write_synced(&tmp, content).await {
            Ok(()) => tokio::fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                tracing::debug!(path = %tmp.display(), error = %cleanup, "temp file not removed");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

async fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(content).await?;
    file.sync_all().await
}
