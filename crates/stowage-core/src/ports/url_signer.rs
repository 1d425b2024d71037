//! UrlSigner port - アクセス URL の発行と検証
//!
//! 有効期限と署名鍵の管理はこの port の実装が担います。
//! ObjectStore は key の存在確認だけを行い、URL の形式には関与しません。
//!
//! # 実装
//! - **PublicUrlSigner**: 無期限の `/uploads/<key>`
//! - **HmacUrlSigner**: `?expires=..&signature=..` 付きの期限付き URL

use std::time::Duration;

use crate::domain::{Locator, ObjectKey, SignedUrl};

/// 署名付き URL の検証エラー
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed url: {0}")]
    Malformed(String),

    #[error("url expired at {expired_at} (unix seconds)")]
    Expired { expired_at: i64 },

    #[error("signature mismatch")]
    Mismatch,
}

/// UrlSigner は key からアクセス URL を発行する
pub trait UrlSigner: Send + Sync {
    /// key の永続的な locator を決める Locator
    fn locator(&self) -> &Locator;

    /// `ttl` が None なら実装の既定値
    fn sign(&self, key: &ObjectKey, ttl: Option<Duration>) -> SignedUrl;

    /// `sign` が発行した URL を検証し、対象の key を返す
    fn verify(&self, url: &str) -> Result<ObjectKey, SignatureError>;
}
