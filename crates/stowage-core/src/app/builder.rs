//! StoreBuilder - 設定からストアを組み立てる
//!
//! # 学習ポイント
//! - 起動時検証（Fail-fast 設計）
//! - 問題はまとめて報告する（1 つずつ直させない）
//! - 組み立て結果は trait object なので、呼び出し側はバックエンドを知らない

use std::sync::Arc;

use crate::app::config::{BackendKind, StorageConfig};
use crate::domain::{Locator, ValidationPolicy};
use crate::impls::{
    HmacUrlSigner, InMemoryObjectStore, LocalFsObjectStore, MockObjectStore, PublicUrlSigner,
    SignerError,
};
use crate::ports::{Clock, ObjectStore, SystemClock, UrlSigner};

/// BuildError はストア構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid storage config: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[error(transparent)]
    Signer(#[from] SignerError),
}

/// 組み立て済みのストレージ一式
pub struct Storage {
    pub backend: BackendKind,
    pub store: Arc<dyn ObjectStore>,
    pub signer: Arc<dyn UrlSigner>,
    pub policy: ValidationPolicy,
}

/// # 使用例
/// ```ignore
/// let storage = StoreBuilder::new(config).build()?;
/// storage.store.put(&key, payload).await?;
/// ```
pub struct StoreBuilder {
    config: StorageConfig,
}

impl StoreBuilder {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// 設定の問題点を全て集める
    fn check(&self) -> Vec<String> {
        let config = &self.config;
        let mut problems = Vec::new();

        if config.backend == BackendKind::Filesystem && config.root.is_none() {
            problems.push("filesystem backend requires a root directory".to_string());
        }
        if matches!(config.signing_secret.as_deref(), Some("")) {
            problems.push("signing secret must not be empty".to_string());
        }
        if config.signed_url_ttl_secs == 0 {
            problems.push("signed url ttl must be greater than zero".to_string());
        }
        let base = config.public_base.as_str();
        if !(base.starts_with('/') || base.starts_with("http://") || base.starts_with("https://")) {
            problems.push(format!(
                "public base {base:?} must start with '/', 'http://' or 'https://'"
            ));
        }
        if config.max_upload_bytes == Some(0) {
            problems.push("max upload bytes must be greater than zero".to_string());
        }

        problems
    }

    pub fn build(self) -> Result<Storage, BuildError> {
        self.build_with_clock(SystemClock)
    }

    /// 署名の有効期限に使う Clock を指定して構築
    pub fn build_with_clock<C: Clock + 'static>(self, clock: C) -> Result<Storage, BuildError> {
        let problems = self.check();
        if !problems.is_empty() {
            return Err(BuildError::InvalidConfig(problems));
        }

        let config = self.config;
        let locator = Locator::new(config.public_base.clone());
        let signer: Arc<dyn UrlSigner> = match config.signing_secret.as_deref() {
            Some(secret) => Arc::new(
                HmacUrlSigner::new(locator.clone(), secret.as_bytes(), clock)?
                    .with_default_ttl(config.signed_url_ttl()),
            ),
            None => Arc::new(PublicUrlSigner::new(locator.clone())),
        };

        let store: Arc<dyn ObjectStore> = match (config.backend, config.root.as_ref()) {
            (BackendKind::Mock, _) => Arc::new(MockObjectStore::new(locator)),
            (BackendKind::Memory, _) => Arc::new(InMemoryObjectStore::with_signer(signer.clone())),
            (BackendKind::Filesystem, Some(root)) => {
                Arc::new(LocalFsObjectStore::with_signer(root, signer.clone()))
            }
            (BackendKind::Filesystem, None) => {
                return Err(BuildError::InvalidConfig(vec![
                    "filesystem backend requires a root directory".to_string(),
                ]));
            }
        };

        tracing::info!(
            backend = %config.backend,
            public_base = %config.public_base,
            signed = config.signing_secret.is_some(),
            "storage ready"
        );

        Ok(Storage {
            backend: config.backend,
            store,
            signer,
            policy: config.validation_policy(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ObjectKey, Payload};
    use std::path::PathBuf;

    #[test]
    fn default_config_builds_mock() {
        let storage = StoreBuilder::new(StorageConfig::default()).build().unwrap();
        assert_eq!(storage.backend, BackendKind::Mock);
        assert_eq!(storage.store.backend_name(), "mock");
    }

    #[test]
    fn filesystem_without_root_fails() {
        let config = StorageConfig {
            backend: BackendKind::Filesystem,
            ..StorageConfig::default()
        };
        let result = StoreBuilder::new(config).build();
        assert!(matches!(
            result,
            Err(BuildError::InvalidConfig(problems)) if problems.len() == 1
        ));
    }

    #[test]
    fn all_problems_are_reported_together() {
        let config = StorageConfig {
            backend: BackendKind::Filesystem,
            signing_secret: Some(String::new()),
            signed_url_ttl_secs: 0,
            public_base: "uploads".to_string(),
            max_upload_bytes: Some(0),
            ..StorageConfig::default()
        };
        let Err(BuildError::InvalidConfig(problems)) = StoreBuilder::new(config).build() else {
            panic!("expected InvalidConfig");
        };
        assert_eq!(problems.len(), 5);
    }

    #[tokio::test]
    async fn secret_enables_signed_urls() {
        let config = StorageConfig {
            backend: BackendKind::Memory,
            signing_secret: Some("s3cret".to_string()),
            ..StorageConfig::default()
        };
        let storage = StoreBuilder::new(config).build().unwrap();
        let key = ObjectKey::new("a.png").unwrap();

        storage.store.put(&key, Payload::from("x")).await.unwrap();
        let signed = storage.store.signed_url(&key, None).await.unwrap();

        assert!(signed.url.contains("signature="));
        assert!(signed.expires_at.is_some());
        assert_eq!(storage.signer.verify(&signed.url).unwrap(), key);
    }

    #[tokio::test]
    async fn filesystem_backend_writes_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: BackendKind::Filesystem,
            root: Some(PathBuf::from(dir.path())),
            public_base: "https://cdn.example.com/uploads".to_string(),
            ..StorageConfig::default()
        };
        let storage = StoreBuilder::new(config).build().unwrap();
        let key = ObjectKey::new("a.png").unwrap();

        let result = storage.store.put(&key, Payload::from("x")).await.unwrap();
        assert_eq!(result.url, "https://cdn.example.com/uploads/a.png");
        assert!(dir.path().join("a.png").exists());
    }

    #[test]
    fn policy_comes_from_config() {
        let config = StorageConfig {
            max_upload_bytes: Some(10),
            allowed_content_types: vec!["image/*".to_string()],
            ..StorageConfig::default()
        };
        let storage = StoreBuilder::new(config).build().unwrap();
        assert_eq!(storage.policy.max_bytes, Some(10));
        assert_eq!(storage.policy.allowed_content_types, vec!["image/*".to_string()]);
    }
}
