//! Uploader - ファイルアップロードのサービス層
//!
//! ValidationPolicy による検査と ObjectStore への put を組み合わせます。
//! key は `<ulid>.<ext>` を生成するので、呼び出し側は衝突を気にしなくてよい。
//!
//! # upload_many の保証
//! all-or-nothing：
//! 1. 先に全ファイルを検査（1 つでも不合格なら何も書かない）
//! 2. put を並行実行
//! 3. 1 つでも失敗したら、バッチの全 key を delete（delete は冪等なので安全）

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::domain::{ObjectKey, Payload, StorageError, UploadId, ValidationPolicy, ValidationResult};
use crate::ports::{IdGenerator, ObjectStore, SystemClock, UlidGenerator};

/// 拡張子として採用する最大長
const MAX_EXTENSION_LEN: usize = 16;

/// アップロード対象のファイル
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub payload: Option<Payload>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self {
            file_name: file_name.into(),
            payload: Some(payload.into()),
        }
    }
}

/// アップロード成功時の受領情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub upload_id: UploadId,
    pub file_name: String,
    pub key: ObjectKey,
    pub url: String,
    pub size: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{file_name} was rejected: {}", .result.error.as_deref().unwrap_or("invalid payload"))]
    Rejected {
        file_name: String,
        result: ValidationResult,
    },

    #[error("{file_name} could not be stored: {source}")]
    Storage {
        file_name: String,
        #[source]
        source: StorageError,
    },
}

impl UploadError {
    pub fn file_name(&self) -> &str {
        match self {
            Self::Rejected { file_name, .. } | Self::Storage { file_name, .. } => file_name,
        }
    }
}

/// 検査を通ったファイルと、書き込み先
struct Planned {
    upload_id: UploadId,
    key: ObjectKey,
    file_name: String,
    payload: Payload,
}

/// # 使用例
/// ```ignore
/// let uploader = Uploader::new(store).with_policy(policy);
/// let receipt = uploader.upload("photo.JPG", Some(payload)).await?;
/// // receipt.key == "01hx....jpg"
/// ```
pub struct Uploader<S, G = UlidGenerator<SystemClock>> {
    store: S,
    ids: G,
    policy: ValidationPolicy,
}

impl<S: ObjectStore> Uploader<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            ids: UlidGenerator::new(SystemClock),
            policy: ValidationPolicy::default(),
        }
    }
}

impl<S: ObjectStore, G: IdGenerator> Uploader<S, G> {
    pub fn with_id_generator<G2: IdGenerator>(self, ids: G2) -> Uploader<S, G2> {
        Uploader {
            store: self.store,
            ids,
            policy: self.policy,
        }
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// 1 ファイルをアップロード
    pub async fn upload(
        &self,
        file_name: &str,
        payload: Option<Payload>,
    ) -> Result<UploadReceipt, UploadError> {
        let planned = self.plan(file_name.to_string(), payload)?;
        let Planned {
            upload_id,
            key,
            file_name,
            payload,
        } = planned;

        let size = payload.len();
        match self.store.put(&key, payload).await {
            Ok(put) => {
                tracing::info!(%upload_id, key = %key, bytes = size, "uploaded {file_name}");
                Ok(UploadReceipt {
                    upload_id,
                    file_name,
                    key,
                    url: put.url,
                    size,
                })
            }
            Err(source) => Err(UploadError::Storage { file_name, source }),
        }
    }

    /// 複数ファイルを all-or-nothing でアップロード
    pub async fn upload_many(
        &self,
        files: Vec<FileUpload>,
    ) -> Result<Vec<UploadReceipt>, UploadError> {
        let batch_id = self.ids.generate_batch_id();

        let mut planned = Vec::with_capacity(files.len());
        for file in files {
            match self.plan(file.file_name, file.payload) {
                Ok(p) => planned.push(p),
                Err(e) => {
                    tracing::info!(%batch_id, file = e.file_name(), "batch rejected before writing");
                    return Err(e);
                }
            }
        }
        let keys: Vec<ObjectKey> = planned.iter().map(|p| p.key.clone()).collect();

        let puts = planned.into_iter().map(|p| async move {
            let size = p.payload.len();
            let result = self.store.put(&p.key, p.payload).await;
            (p.upload_id, p.key, p.file_name, size, result)
        });

        let mut receipts = Vec::with_capacity(keys.len());
        let mut first_error = None;
        for (upload_id, key, file_name, size, result) in join_all(puts).await {
            match result {
                Ok(put) => receipts.push(UploadReceipt {
                    upload_id,
                    file_name,
                    key,
                    url: put.url,
                    size,
                }),
                Err(source) => {
                    if first_error.is_none() {
                        first_error = Some(UploadError::Storage { file_name, source });
                    }
                }
            }
        }

        if let Some(err) = first_error {
            tracing::warn!(%batch_id, error = %err, "batch failed, rolling back");
            self.rollback(&keys).await;
            return Err(err);
        }

        tracing::info!(%batch_id, files = receipts.len(), "batch uploaded");
        Ok(receipts)
    }

    /// 検査して key を決める
    fn plan(&self, file_name: String, payload: Option<Payload>) -> Result<Planned, UploadError> {
        let result = self.policy.validate(payload.as_ref());
        let payload = match payload {
            Some(payload) if result.valid => payload,
            _ => return Err(UploadError::Rejected { file_name, result }),
        };

        let upload_id = self.ids.generate_upload_id();
        let key = key_for(&upload_id, &file_name).map_err(|source| UploadError::Storage {
            file_name: file_name.clone(),
            source,
        })?;

        Ok(Planned {
            upload_id,
            key,
            file_name,
            payload,
        })
    }

    async fn rollback(&self, keys: &[ObjectKey]) {
        for key in keys {
            if let Err(e) = self.store.delete(key).await {
                tracing::warn!(key = %key, error = %e, "rollback delete failed");
            }
        }
    }
}

/// `<ulid>.<ext>`。拡張子は英数字のみ採用し、小文字にそろえる
pub fn key_for(upload_id: &UploadId, file_name: &str) -> Result<ObjectKey, StorageError> {
    let stem = upload_id.key_stem();
    let base_name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let extension = base_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });

    match extension {
        Some(ext) => ObjectKey::new(format!("{stem}.{}", ext.to_ascii_lowercase())),
        None => ObjectKey::new(stem),
    }
}
