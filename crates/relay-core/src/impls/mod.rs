//! Impls - ports の実装（開発用・テスト用・ローカル実行用）
//!
//! # 含まれる実装
//! - **InMemoryDeliveryQueue**: visibility timeout 付きの配送キュー
//! - **InMemoryBlobStore / LocalBlobStore**: オブジェクトストア
//! - **RecordingTopic / LoggingTopic**: 通知トピック
//! - **InMemoryDeadLetterSink / JsonlDeadLetterSink**: dead-letter
//!
//! 本番のクラウド実装（SQS/S3/SNS）はこのクレートの外に置きます。

pub mod dead_letter;
pub mod inmem_blob;
pub mod inmem_delivery;
pub mod local_blob;
pub mod topic;

pub use self::dead_letter::{DeadLetterRecord, InMemoryDeadLetterSink, JsonlDeadLetterSink};
pub use self::inmem_blob::InMemoryBlobStore;
pub use self::inmem_delivery::InMemoryDeliveryQueue;
pub use self::local_blob::LocalBlobStore;
pub use self::topic::{LoggingTopic, PublishedNotification, RecordingTopic};
