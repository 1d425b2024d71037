//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **MockObjectStore**: 何も保存しない開発用スタブ
//! - **InMemoryObjectStore**: テスト用の正本
//! - **LocalFsObjectStore**: ローカルディレクトリ
//! - **PublicUrlSigner / HmacUrlSigner**: UrlSigner

pub mod mock;
pub mod memory;
pub mod local_fs;
pub mod signer;

#[cfg(test)]
mod contract;

// 主要な型を再エクスポート
pub use self::mock::MockObjectStore;
pub use self::memory::InMemoryObjectStore;
pub use self::local_fs::LocalFsObjectStore;
pub use self::signer::{
    DEFAULT_SIGNED_URL_TTL, HmacUrlSigner, MAX_SIGNED_URL_TTL, PublicUrlSigner, SignerError,
};
