//! stowage-core
//!
//! オブジェクトストレージの port と、その実装。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ObjectKey, Payload, ValidationResult, PutResult, SignedUrl, errors）
//! - **ports**: 抽象化レイヤー（ObjectStore, UrlSigner, Clock, IdGenerator）
//! - **impls**: 実装（MockObjectStore, InMemoryObjectStore, LocalFsObjectStore, 署名）
//! - **app**: アプリケーション層（StorageConfig, StoreBuilder, Uploader）

pub mod domain;
pub mod ports;
pub mod impls;
pub mod app;
