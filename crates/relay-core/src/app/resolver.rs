//! EnvelopeResolver - 配送ペイロードからソースオブジェクトの参照を取り出す
//!
//! ペイロードは 2 つの形のどちらか：
//! - (a) トピック経由: `{"Message": "<ストレージイベントの JSON 文字列>", ...}`
//! - (b) 直接配送: ストレージイベントそのもの `{"Records": [...]}`
//!
//! 判定は「文字列の `Message` フィールドを持つか」で行い、(a) を優先します。
//! 先頭レコードのみ解決します（1 イベント内の複数レコードは扱わない）。

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{PipelineError, StorageReference};

#[derive(Debug, Deserialize)]
struct StorageEvent {
    #[serde(rename = "Records")]
    records: Vec<EventRecord>,
}

#[derive(Debug, Deserialize)]
struct EventRecord {
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: BucketEntity,
    object: ObjectEntity,
}

#[derive(Debug, Deserialize)]
struct BucketEntity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ObjectEntity {
    key: String,
}

/// The two payload shapes the queue can deliver.
#[derive(Debug, PartialEq)]
enum NotificationShape {
    /// Transport envelope; holds the serialized inner event.
    Wrapped(String),
    /// The storage event itself.
    Direct(Value),
}

impl NotificationShape {
    fn classify(value: Value) -> Result<Self, PipelineError> {
        match value.get("Message") {
            Some(Value::String(inner)) => Ok(NotificationShape::Wrapped(inner.clone())),
            Some(_) => Err(PipelineError::malformed(
                "'Message' field is present but is not a string",
            )),
            None => Ok(NotificationShape::Direct(value)),
        }
    }

    fn into_event(self) -> Result<StorageEvent, PipelineError> {
        let (value, origin) = match self {
            NotificationShape::Wrapped(inner) => {
                let value: Value = serde_json::from_str(&inner).map_err(|e| {
                    PipelineError::malformed(format!("'Message' is not valid JSON: {e}"))
                })?;
                (value, "wrapped event")
            }
            NotificationShape::Direct(value) => (value, "event"),
        };
        if value.get("Records").is_none() {
            return Err(PipelineError::malformed(format!(
                "{origin} has no 'Records' array"
            )));
        }
        serde_json::from_value(value).map_err(|e| {
            PipelineError::malformed(format!("{origin} does not match the storage event shape: {e}"))
        })
    }
}

/// Object keys arrive form-encoded in storage notifications.
fn decode_key(raw: &str) -> Result<String, PipelineError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|key| key.into_owned())
        .map_err(|e| PipelineError::malformed(format!("object key '{raw}' is not valid UTF-8: {e}")))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeResolver;

impl EnvelopeResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a payload to the object it announces. Pure: same payload, same reference.
    pub fn resolve(&self, payload: &str) -> Result<StorageReference, PipelineError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| PipelineError::malformed(format!("payload is not valid JSON: {e}")))?;

        let event = NotificationShape::classify(value)?.into_event()?;

        let record_count = event.records.len();
        let Some(first) = event.records.into_iter().next() else {
            return Err(PipelineError::malformed("'Records' array is empty"));
        };
        if record_count > 1 {
            tracing::warn!(
                record_count,
                "event carries several records; only the first is processed"
            );
        }

        let store = first.s3.bucket.name;
        let key = decode_key(&first.s3.object.key)?;
        if store.is_empty() {
            return Err(PipelineError::malformed("bucket name is empty"));
        }
        if key.is_empty() {
            return Err(PipelineError::malformed("object key is empty"));
        }
        Ok(StorageReference::new(store, key))
    }
}
