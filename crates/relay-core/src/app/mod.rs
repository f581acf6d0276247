//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてパイプラインを実装します。
//!
//! # 主要コンポーネント
//! - **CoordinatorBuilder**: ポートと設定のワイヤリング
//! - **QueueConsumer**: バッチ受信と ack
//! - **EnvelopeResolver**: ペイロード → StorageReference
//! - **TransformStage**: 取得・変換・保存
//! - **PipelineCoordinator**: メッセージ単位の実行とバッチ集計

pub mod builder;
pub mod consumer;
pub mod coordinator;
pub mod resolver;
pub mod transform;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, CoordinatorBuilder};
pub use self::consumer::QueueConsumer;
pub use self::coordinator::{HandlerResponse, NO_MESSAGES_BODY, PipelineCoordinator};
pub use self::resolver::EnvelopeResolver;
pub use self::transform::{Partition, PartitionRemap, TransformStage};
