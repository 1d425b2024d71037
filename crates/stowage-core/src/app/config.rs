//! StorageConfig - バックエンドの選択と設定
//!
//! JSON ファイルから読み込めます。省略したフィールドは既定値になります。
//!
//! ```json
//! {
//!   "backend": "filesystem",
//!   "root": "/var/lib/stowage",
//!   "signing_secret": "change-me",
//!   "max_upload_bytes": 10485760,
//!   "allowed_content_types": ["image/*", "video/*"]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::domain::{DEFAULT_PUBLIC_BASE, ValidationPolicy};
use crate::impls::DEFAULT_SIGNED_URL_TTL;

/// BackendKind は ObjectStore の実装の選択
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Mock,
    Memory,
    Filesystem,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mock => "mock",
            Self::Memory => "memory",
            Self::Filesystem => "filesystem",
        };
        f.write_str(name)
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "memory" | "inmemory" => Ok(Self::Memory),
            "filesystem" | "fs" | "local" => Ok(Self::Filesystem),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown backend {0:?} (expected mock, memory or filesystem)")]
    UnknownBackend(String),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: BackendKind,
    /// filesystem バックエンドの保存先
    pub root: Option<PathBuf>,
    pub public_base: String,
    /// 設定すると HMAC 署名付き URL を発行する
    pub signing_secret: Option<String>,
    pub signed_url_ttl_secs: u64,
    pub max_upload_bytes: Option<usize>,
    pub allowed_content_types: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            root: None,
            public_base: DEFAULT_PUBLIC_BASE.to_string(),
            signing_secret: None,
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL.as_secs(),
            max_upload_bytes: None,
            allowed_content_types: Vec::new(),
        }
    }
}

// signing_secret をログに出さない
impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field("root", &self.root)
            .field("public_base", &self.public_base)
            .field(
                "signing_secret",
                &self.signing_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("signed_url_ttl_secs", &self.signed_url_ttl_secs)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("allowed_content_types", &self.allowed_content_types)
            .finish()
    }
}

impl StorageConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            max_bytes: self.max_upload_bytes,
            allowed_content_types: self.allowed_content_types.clone(),
        }
    }
}
