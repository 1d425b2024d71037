//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（ファイルシステム、Blob storage など）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - 呼び出し側は `ObjectStore` だけに依存する
//! - URL の署名方式は `UrlSigner` として差し替え可能
//! - 時刻と ID 生成は trait で注入（テストで決定的にできる）

pub mod object_store;
pub mod url_signer;
pub mod clock;
pub mod id_generator;

// 主要な trait を再エクスポート
pub use self::object_store::ObjectStore;
pub use self::url_signer::{SignatureError, UrlSigner};
pub use self::clock::{Clock, SystemClock, FixedClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
