//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」。外部システム（キュー、オブジェクト
//! ストレージ、通知トピック、dead-letter）へのインターフェースを定義し、
//! コーディネータにはコンストラクタ経由で注入します。
//! テストでは impls の InMemory 実装に差し替えます。

pub mod blob_store;
pub mod clock;
pub mod dead_letter;
pub mod delivery_queue;
pub mod id_generator;
pub mod notification_topic;

pub use self::blob_store::{BlobError, BlobStore, StoredObject};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::dead_letter::{DeadLetterError, DeadLetterSink};
pub use self::delivery_queue::{DeliveryQueue, QueueError};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::notification_topic::{NotificationTopic, PublishError};
