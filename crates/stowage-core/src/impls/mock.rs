//! MockObjectStore - 開発用スタブ
//!
//! 何も保存しません。put/delete は常に成功し、get は常に None、
//! exists は常に true を返します。
//! 本物のバックエンドが無い段階で呼び出し側を動かすためのものです。

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::{Locator, ObjectKey, Payload, PutResult, SignedUrl, StorageError};
use crate::ports::ObjectStore;

#[derive(Debug, Clone, Default)]
pub struct MockObjectStore {
    locator: Locator,
}

impl MockObjectStore {
    pub fn new(locator: Locator) -> Self {
        Self { locator }
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    fn backend_name(&self) -> &'static str {
        "mock"
    }

    async fn put(&self, key: &ObjectKey, payload: Payload) -> Result<PutResult, StorageError> {
        tracing::info!(key = %key, bytes = payload.len(), "mock storage put");
        Ok(PutResult::stored(key.clone(), self.locator.url_for(key)))
    }

    async fn get(&self, _key: &ObjectKey) -> Result<Option<Payload>, StorageError> {
        Ok(None)
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StorageError> {
        tracing::info!(key = %key, "mock storage delete");
        Ok(())
    }

    async fn exists(&self, _key: &ObjectKey) -> Result<bool, StorageError> {
        Ok(true)
    }

    async fn signed_url(
        &self,
        key: &ObjectKey,
        _ttl: Option<Duration>,
    ) -> Result<SignedUrl, StorageError> {
        Ok(SignedUrl::permanent(self.locator.url_for(key)))
    }
}
