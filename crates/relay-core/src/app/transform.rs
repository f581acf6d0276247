//! TransformStage - 取得・変換・保存
//!
//! # フロー
//! 1. fetch: ソースオブジェクトを取得（UTF-8 でなければ ObjectUnreadable）
//! 2. transform: 純粋関数。CSV を正規化し、キーから導出した列を付与
//! 3. store: ターゲットキーに上書き保存
//!
//! # 決定性
//! 出力は (キー, 内容) だけで決まります。現在時刻は埋め込まないので、
//! 再配送されたメッセージを何度処理しても同じバイト列になります。

use std::sync::Arc;

use chrono::{NaiveDate, SecondsFormat};

use crate::domain::{Blob, ContentType, PipelineError, StorageReference, TransformedBlob};
use crate::ports::{BlobError, BlobStore};

pub const SOURCE_COLUMN: &str = "source";
pub const PARTITION_TIMESTAMP_COLUMN: &str = "partition_timestamp";

/// Substitutes `<from>/` with `<to>/` in a key (`raw/...` → `processed/...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionRemap {
    from: String,
    to: String,
}

impl PartitionRemap {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    fn needle(&self) -> String {
        format!("{}/", self.from)
    }

    /// Every occurrence of `<from>/` is replaced, not only the first.
    pub fn target_key_for(&self, source_key: &str) -> Result<String, PipelineError> {
        let needle = self.needle();
        if !source_key.contains(&needle) {
            return Err(PipelineError::UnmappableKey {
                key: source_key.to_string(),
                reason: format!("no '{needle}' to remap"),
            });
        }
        Ok(source_key.replace(&needle, &format!("{}/", self.to)))
    }

    /// Parse `<from>/<source>/<yyyy>/<mm>/<dd>/<HHMM>.<ext>` out of a key,
    /// starting after the first `<from>/`. Parts that don't follow the
    /// layout come back as `None`.
    pub fn partition_of(&self, source_key: &str) -> Partition {
        let needle = self.needle();
        let Some(pos) = source_key.find(&needle) else {
            return Partition::default();
        };
        let rest: Vec<&str> = source_key[pos + needle.len()..].split('/').collect();
        let source = match rest.as_slice() {
            [source, _, ..] if !source.is_empty() => Some(source.to_string()),
            _ => None,
        };
        let timestamp = match rest.as_slice() {
            [_, yyyy, mm, dd, file] => parse_timestamp(yyyy, mm, dd, file),
            _ => None,
        };
        Partition { source, timestamp }
    }
}

fn parse_timestamp(yyyy: &str, mm: &str, dd: &str, file: &str) -> Option<String> {
    let stem = file.split('.').next()?;
    if stem.len() != 4 || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if yyyy.len() != 4 || mm.len() != 2 || dd.len() != 2 {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(yyyy.parse().ok()?, mm.parse().ok()?, dd.parse().ok()?)?;
    let time = date.and_hms_opt(stem[..2].parse().ok()?, stem[2..].parse().ok()?, 0)?;
    Some(time.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Values derived from an object's key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub source: Option<String>,
    /// RFC 3339, UTC.
    pub timestamp: Option<String>,
}

pub struct TransformStage {
    store: Arc<dyn BlobStore>,
    remap: PartitionRemap,
}

impl TransformStage {
    pub fn new(store: Arc<dyn BlobStore>, remap: PartitionRemap) -> Self {
        Self { store, remap }
    }

    pub fn remap(&self) -> &PartitionRemap {
        &self.remap
    }

    pub fn target_key_for(&self, source_key: &str) -> Result<String, PipelineError> {
        self.remap.target_key_for(source_key)
    }

    pub async fn fetch(&self, reference: &StorageReference) -> Result<Blob, PipelineError> {
        let object = self.store.get(reference).await.map_err(|e| match e {
            BlobError::NotFound(r) => PipelineError::ObjectNotFound(r),
            BlobError::InvalidKey { reason, .. } => PipelineError::ObjectUnreadable {
                reference: reference.clone(),
                reason,
            },
            other => PipelineError::transport("get", other),
        })?;

        if let Err(e) = std::str::from_utf8(&object.content) {
            return Err(PipelineError::ObjectUnreadable {
                reference: reference.clone(),
                reason: format!("content is not UTF-8: {e}"),
            });
        }

        Ok(Blob {
            reference: reference.clone(),
            content: object.content,
            content_type: object.content_type,
        })
    }

    /// Pure transform. Short rows are padded with empty strings, surplus
    /// fields are dropped, and `source` / `partition_timestamp` are filled
    /// from the key (appended when the header lacks them, otherwise used for
    /// empty cells only).
    pub fn transform(&self, blob: &Blob) -> Result<TransformedBlob, PipelineError> {
        let key = blob.reference.key();
        let target = blob.reference.with_key(self.target_key_for(key)?);
        let transform_error = |reason: String| PipelineError::TransformError {
            reference: blob.reference.clone(),
            reason,
        };

        let partition = self.remap.partition_of(key);
        let derived = [
            (SOURCE_COLUMN, partition.source.unwrap_or_default()),
            (PARTITION_TIMESTAMP_COLUMN, partition.timestamp.unwrap_or_default()),
        ];

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(blob.content.as_slice());
        let mut header: Vec<String> = reader
            .headers()
            .map_err(|e| transform_error(format!("unreadable header: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();
        let width = header.len();

        // (column index, value) for each derived column
        let mut fills = Vec::with_capacity(derived.len());
        for (name, value) in &derived {
            match header.iter().position(|h| h == name) {
                Some(idx) => fills.push((idx, value.as_str())),
                None => {
                    header.push(name.to_string());
                    fills.push((header.len() - 1, value.as_str()));
                }
            }
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&header)
            .map_err(|e| transform_error(e.to_string()))?;

        let mut rows = 0;
        for record in reader.records() {
            let record = record.map_err(|e| transform_error(format!("row {}: {e}", rows + 1)))?;
            let mut row: Vec<&str> = (0..width).map(|i| record.get(i).unwrap_or("")).collect();
            row.resize(header.len(), "");
            for &(idx, value) in &fills {
                if row[idx].is_empty() {
                    row[idx] = value;
                }
            }
            writer
                .write_record(&row)
                .map_err(|e| transform_error(e.to_string()))?;
            rows += 1;
        }

        let content = writer
            .into_inner()
            .map_err(|e| transform_error(e.to_string()))?;

        Ok(TransformedBlob {
            reference: target,
            content,
            content_type: ContentType::Csv,
            rows,
        })
    }

    /// Overwrite the target key. Returns once the store reports the write
    /// as durable (the local store syncs to disk first).
    pub async fn store(&self, transformed: &TransformedBlob) -> Result<(), PipelineError> {
        self.store
            .put(
                &transformed.reference,
                &transformed.content,
                &transformed.content_type,
            )
            .await
            .map_err(|e| PipelineError::transport("put", e))
    }
}
