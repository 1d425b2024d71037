//! ObjectStore port - オブジェクトストレージの抽象化
//!
//! 呼び出し側（Uploader, CLI）を具体的なバックエンドから切り離します。
//!
//! # 実装
//! - **MockObjectStore**: 常に成功する開発用スタブ
//! - **InMemoryObjectStore**: テスト用の実装
//! - **LocalFsObjectStore**: ディレクトリ配下に保存する実装

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{ObjectKey, Payload, PutResult, SignedUrl, StorageError, ValidationResult};

/// ObjectStore はストレージバックエンドが満たす契約
///
/// # 設計原則
/// - `Arc<dyn ObjectStore>` として注入できる（object safe）
/// - put は last-writer-wins
/// - delete は冪等（存在しない key の削除は成功）
/// - get の「見つからない」は `Ok(None)` で返す
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数タスクから共有される）
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// ログ用のバックエンド名
    fn backend_name(&self) -> &'static str;

    /// 保存前の検査（存在チェックのみ）
    fn validate(&self, payload: Option<&Payload>) -> ValidationResult {
        crate::domain::validate(payload)
    }

    /// payload を key に保存し、locator を返す
    async fn put(&self, key: &ObjectKey, payload: Payload) -> Result<PutResult, StorageError>;

    /// 保存済みの payload を取得（無ければ None）
    async fn get(&self, key: &ObjectKey) -> Result<Option<Payload>, StorageError>;

    /// key を削除（冪等）
    async fn delete(&self, key: &ObjectKey) -> Result<(), StorageError>;

    /// key が現在保存されているか
    async fn exists(&self, key: &ObjectKey) -> Result<bool, StorageError>;

    /// アクセス用 URL を発行
    ///
    /// `ttl` が None ならバックエンドの既定値を使います。
    async fn signed_url(
        &self,
        key: &ObjectKey,
        ttl: Option<Duration>,
    ) -> Result<SignedUrl, StorageError>;

    /// get の「見つからない」を NotFound エラーに変換
    async fn require(&self, key: &ObjectKey) -> Result<Payload, StorageError> {
        self.get(key)
            .await?
            .ok_or_else(|| StorageError::not_found(key.as_str()))
    }
}

#[async_trait]
impl<S: ObjectStore + ?Sized> ObjectStore for Arc<S> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn validate(&self, payload: Option<&Payload>) -> ValidationResult {
        (**self).validate(payload)
    }

    async fn put(&self, key: &ObjectKey, payload: Payload) -> Result<PutResult, StorageError> {
        (**self).put(key, payload).await
    }

    async fn get(&self, key: &ObjectKey) -> Result<Option<Payload>, StorageError> {
        (**self).get(key).await
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StorageError> {
        (**self).delete(key).await
    }

    async fn exists(&self, key: &ObjectKey) -> Result<bool, StorageError> {
        (**self).exists(key).await
    }

    async fn signed_url(
        &self,
        key: &ObjectKey,
        ttl: Option<Duration>,
    ) -> Result<SignedUrl, StorageError> {
        (**self).signed_url(key, ttl).await
    }
}

#[async_trait]
impl<S: ObjectStore + ?Sized> ObjectStore for Box<S> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn validate(&self, payload: Option<&Payload>) -> ValidationResult {
        (**self).validate(payload)
    }

    async fn put(&self, key: &ObjectKey, payload: Payload) -> Result<PutResult, StorageError> {
        (**self).put(key, payload).await
    }

    async fn get(&self, key: &ObjectKey) -> Result<Option<Payload>, StorageError> {
        (**self).get(key).await
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StorageError> {
        (**self).delete(key).await
    }

    async fn exists(&self, key: &ObjectKey) -> Result<bool, StorageError> {
        (**self).exists(key).await
    }

    async fn signed_url(
        &self,
        key: &ObjectKey,
        ttl: Option<Duration>,
    ) -> Result<SignedUrl, StorageError> {
        (**self).signed_url(key, ttl).await
    }
}
