//! UrlSigner の実装
//!
//! # 署名形式（HmacUrlSigner）
//! ```text
//! <base>/<key>?expires=<unix-seconds>&signature=<hex(HMAC-SHA256(key "\n" expires))>
//! ```
//! key に `?` が含まれても、クエリは最後の `?` 以降として解釈します。

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

use crate::domain::{Locator, ObjectKey, SignedUrl};
use crate::ports::{Clock, SignatureError, SystemClock, UrlSigner};

type HmacSha256 = Hmac<Sha256>;

/// 署名付き URL の既定の有効期間
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// 有効期間の上限（7 日）
pub const MAX_SIGNED_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Signer 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("invalid signing secret: {0}")]
    InvalidSecret(String),
}

/// 無期限の公開 URL（locator そのもの）
#[derive(Debug, Clone, Default)]
pub struct PublicUrlSigner {
    locator: Locator,
}

impl PublicUrlSigner {
    pub fn new(locator: Locator) -> Self {
        Self { locator }
    }
}

impl UrlSigner for PublicUrlSigner {
    fn locator(&self) -> &Locator {
        &self.locator
    }

    fn sign(&self, key: &ObjectKey, _ttl: Option<Duration>) -> SignedUrl {
        SignedUrl::permanent(self.locator.url_for(key))
    }

    /// key は不透明なので `?` を含んでもよい。署名クエリの付いた URL だけ拒否する
    fn verify(&self, url: &str) -> Result<ObjectKey, SignatureError> {
        let key = self
            .locator
            .key_of(url)
            .ok_or_else(|| SignatureError::Malformed(format!("not under {}", self.locator.base())))?;
        if let Some((_, query)) = key.rsplit_once('?')
            && query.split('&').any(is_signature_param)
        {
            return Err(SignatureError::Malformed(
                "public urls carry no signature".to_string(),
            ));
        }
        ObjectKey::new(key).map_err(|e| SignatureError::Malformed(e.to_string()))
    }
}

fn is_signature_param(pair: &str) -> bool {
    matches!(pair.split_once('='), Some(("expires" | "signature", _)))
}

/// HMAC-SHA256 で署名した期限付き URL
///
/// # 設計原則
/// - 共有シークレットで署名し、検証は定数時間比較
/// - 有効期限は注入された Clock から計算（テストでは FixedClock）
/// - TTL は `MAX_SIGNED_URL_TTL` で頭打ち
pub struct HmacUrlSigner<C = SystemClock> {
    locator: Locator,
    mac: HmacSha256,
    default_ttl: Duration,
    clock: C,
}

impl<C: Clock> HmacUrlSigner<C> {
    pub fn new(locator: Locator, secret: &[u8], clock: C) -> Result<Self, SignerError> {
        if secret.is_empty() {
            return Err(SignerError::EmptySecret);
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| SignerError::InvalidSecret(e.to_string()))?;
        Ok(Self {
            locator,
            mac,
            default_ttl: DEFAULT_SIGNED_URL_TTL,
            clock,
        })
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    fn mac_for(&self, key: &str, expires: i64) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        mac
    }
}

impl<C: Clock> UrlSigner for HmacUrlSigner<C> {
    fn locator(&self) -> &Locator {
        &self.locator
    }

    fn sign(&self, key: &ObjectKey, ttl: Option<Duration>) -> SignedUrl {
        let ttl = ttl.unwrap_or(self.default_ttl).min(MAX_SIGNED_URL_TTL);
        let expires_at = self.clock.now() + chrono::Duration::seconds(ttl.as_secs() as i64);
        let expires = expires_at.timestamp();
        let signature = hex::encode(self.mac_for(key.as_str(), expires).finalize().into_bytes());

        SignedUrl {
            url: format!(
                "{}?expires={expires}&signature={signature}",
                self.locator.url_for(key)
            ),
            expires_at: Some(expires_at),
        }
    }

    fn verify(&self, url: &str) -> Result<ObjectKey, SignatureError> {
        let (path, query) = url
            .rsplit_once('?')
            .ok_or_else(|| SignatureError::Malformed("missing query".to_string()))?;
        let key = self
            .locator
            .key_of(path)
            .ok_or_else(|| SignatureError::Malformed(format!("not under {}", self.locator.base())))?;

        let mut expires = None;
        let mut signature = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", v)) => {
                    let v = v
                        .parse::<i64>()
                        .map_err(|e| SignatureError::Malformed(format!("expires: {e}")))?;
                    expires = Some(v);
                }
                Some(("signature", v)) => {
                    let v = hex::decode(v)
                        .map_err(|e| SignatureError::Malformed(format!("signature: {e}")))?;
                    signature = Some(v);
                }
                _ => {}
            }
        }
        let expires =
            expires.ok_or_else(|| SignatureError::Malformed("missing expires".to_string()))?;
        let signature =
            signature.ok_or_else(|| SignatureError::Malformed("missing signature".to_string()))?;

        self.mac_for(key, expires)
            .verify_slice(&signature)
            .map_err(|_| SignatureError::Mismatch)?;

        if self.clock.now().timestamp() > expires {
            return Err(SignatureError::Expired {
                expired_at: expires,
            });
        }

        ObjectKey::new(key).map_err(|e| SignatureError::Malformed(e.to_string()))
    }
}
