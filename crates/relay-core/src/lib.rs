//! relay-core
//!
//! Core building blocks for the Relay transform pipeline.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, envelope, reference, state, outcome, errors, events）
//! - **ports**: 抽象化レイヤー（DeliveryQueue, BlobStore, NotificationTopic, DeadLetterSink, など）
//! - **app**: アプリケーションロジック（builder, consumer, resolver, transform, coordinator）
//! - **impls**: 実装（InMemoryDeliveryQueue, LocalBlobStore など開発用）
//! - **config**: TOML 設定
//! - **observability**: キューの状態ビュー

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
