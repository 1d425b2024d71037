//! Locator - key から外部参照可能な URL への対応付け
//!
//! 既定の名前空間は `/uploads/<key>` です。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::key::ObjectKey;

pub const DEFAULT_PUBLIC_BASE: &str = "/uploads";

/// Locator は key を `<base>/<key>` に写像する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    base: String,
}

impl Locator {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url_for(&self, key: &ObjectKey) -> String {
        format!("{}/{}", self.base, key)
    }

    /// `url_for` の逆変換。base 配下でなければ None
    pub fn key_of<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.base.as_str())?
            .strip_prefix('/')
            .filter(|k| !k.is_empty())
    }
}

impl Default for Locator {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_BASE)
    }
}

/// SignedUrl はアクセス用 URL
///
/// `expires_at` が None なら無期限。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUrl {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SignedUrl {
    pub fn permanent(url: String) -> Self {
        Self {
            url,
            expires_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_locator_maps_to_uploads() {
        let key = ObjectKey::new("a.png").unwrap();
        assert_eq!(Locator::default().url_for(&key), "/uploads/a.png");
    }

    #[test]
    fn trailing_slash_in_base_is_trimmed() {
        let key = ObjectKey::new("x/y.txt").unwrap();
        let locator = Locator::new("https://cdn.example.com/files/");
        assert_eq!(locator.url_for(&key), "https://cdn.example.com/files/x/y.txt");
    }

    #[test]
    fn key_of_inverts_url_for() {
        let locator = Locator::default();
        assert_eq!(locator.key_of("/uploads/a/b.png"), Some("a/b.png"));
        assert_eq!(locator.key_of("/uploads/"), None);
        assert_eq!(locator.key_of("/uploadsx/a.png"), None);
        assert_eq!(locator.key_of("/other/a.png"), None);
    }
}
