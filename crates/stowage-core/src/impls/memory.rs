//! InMemoryObjectStore - テスト・開発用のストア
//!
//! # 実装詳細
//! - HashMap<ObjectKey, Payload> を RwLock で保護
//! - 1 つのロックで全操作を直列化するので、同じ key への get/delete は線形化可能
//! - put は last-writer-wins

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::{ObjectKey, Payload, PutResult, SignedUrl, StorageError};
use crate::impls::signer::PublicUrlSigner;
use crate::ports::{ObjectStore, UrlSigner};

/// # 使用例
/// ```ignore
/// let store = InMemoryObjectStore::new();
/// store.put(&key, Payload::from("hello")).await?;
/// assert!(store.exists(&key).await?);
/// ```
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectKey, Payload>>,
    signer: Arc<dyn UrlSigner>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::with_signer(Arc::new(PublicUrlSigner::default()))
    }

    pub fn with_signer(signer: Arc<dyn UrlSigner>) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            signer,
        }
    }

    /// 保存されているオブジェクト数
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, key: &ObjectKey, payload: Payload) -> Result<PutResult, StorageError> {
        let bytes = payload.len();
        let replaced = self
            .objects
            .write()
            .await
            .insert(key.clone(), payload)
            .is_some();
        tracing::debug!(key = %key, bytes, replaced, "stored object");
        Ok(PutResult::stored(key.clone(), self.signer.locator().url_for(key)))
    }

    async fn get(&self, key: &ObjectKey) -> Result<Option<Payload>, StorageError> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StorageError> {
        if self.objects.write().await.remove(key).is_some() {
            tracing::debug!(key = %key, "deleted object");
        }
        Ok(())
    }

    async fn exists(&self, key: &ObjectKey) -> Result<bool, StorageError> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn signed_url(
        &self,
        key: &ObjectKey,
        ttl: Option<Duration>,
    ) -> Result<SignedUrl, StorageError> {
        if !self.exists(key).await? {
            return Err(StorageError::not_found(key.as_str()));
        }
        Ok(self.signer.sign(key, ttl))
    }
}
