//! App - アプリケーション層
//!
//! ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **StorageConfig**: バックエンドの選択と設定
//! - **StoreBuilder**: 設定からストアを組み立てる（起動時検証）
//! - **Uploader**: 検査 + key 生成 + put

pub mod config;
pub mod builder;
pub mod uploader;

// 主要な型を再エクスポート
pub use self::config::{BackendKind, ConfigError, StorageConfig};
pub use self::builder::{BuildError, Storage, StoreBuilder};
pub use self::uploader::{FileUpload, UploadError, UploadReceipt, Uploader};
