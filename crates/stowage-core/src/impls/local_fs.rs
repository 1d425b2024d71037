//! LocalFsObjectStore - ローカルディレクトリに保存する ObjectStore
//!
//! key を `/` で区切り、root 配下のパスにマップします。
//!
//! # key の制約
//! root の外を指しうる key は InvalidKey として拒否します：
//! 絶対パス、空・`.`・`..` のセグメント、バックスラッシュ、NUL。
//!
//! `a` と `a/b` のように、ファイルとディレクトリを取り合う key は
//! 同時に保存できません。後から put した側が InvalidKey になります。
//!
//! # 書き込み
//! 同じディレクトリの一時ファイルに書いてから rename するので、
//! 読み手が書きかけのオブジェクトを見ることはありません。
//! content type は保存しません。
//!
//! delete は空になった親ディレクトリを片付けます。並行する put が
//! 親ディレクトリを失った場合は、作り直して `MAX_PUT_ATTEMPTS` 回まで書き直します。

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use ulid::Ulid;

use crate::domain::{ObjectKey, Payload, PutResult, SignedUrl, StorageError};
use crate::impls::signer::PublicUrlSigner;
use crate::ports::{ObjectStore, UrlSigner};

/// 並行 delete に親ディレクトリを消されたときの put の試行回数
const MAX_PUT_ATTEMPTS: usize = 4;

pub struct LocalFsObjectStore {
    root: PathBuf,
    signer: Arc<dyn UrlSigner>,
}

impl LocalFsObjectStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self::with_signer(root, Arc::new(PublicUrlSigner::default()))
    }

    pub fn with_signer<P: AsRef<Path>>(root: P, signer: Arc<dyn UrlSigner>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            signer,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &ObjectKey) -> Result<PathBuf, StorageError> {
        let raw = key.as_str();
        if raw.contains('\0') {
            return Err(StorageError::invalid_key(raw, "contains NUL byte"));
        }
        if raw.contains('\\') {
            return Err(StorageError::invalid_key(raw, "contains backslash"));
        }
        if raw.starts_with('/') {
            return Err(StorageError::invalid_key(raw, "must be relative"));
        }

        let mut path = self.root.clone();
        for segment in raw.split('/') {
            match segment {
                "" => return Err(StorageError::invalid_key(raw, "contains empty segment")),
                "." | ".." => {
                    return Err(StorageError::invalid_key(raw, "contains relative segment"));
                }
                s => path.push(s),
            }
        }
        Ok(path)
    }

    async fn is_stored(&self, key: &ObjectKey, path: &Path) -> Result<bool, StorageError> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if is_absent(&e) => Ok(false),
            Err(e) => Err(StorageError::from_io(key.as_str(), e)),
        }
    }

    /// delete 後に空になった親ディレクトリを root まで片付ける
    async fn prune_empty_parents(&self, path: &Path) {
        let mut dir = path.parent();
        while let Some(d) = dir {
            if d == self.root || !d.starts_with(&self.root) {
                break;
            }
            if fs::remove_dir(d).await.is_err() {
                break;
            }
            dir = d.parent();
        }
    }

    /// ディレクトリ作成から rename までを 1 回試す
    async fn try_put(&self, key: &ObjectKey, path: &Path, data: &[u8]) -> io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }
        let tmp = path.with_file_name(format!(".{}.{}.tmp", key.file_name(), Ulid::new()));
        let result = write_atomically(path, &tmp, data).await;
        if result.is_err() {
            let _ = fs::remove_file(&tmp).await;
        }
        result
    }

    /// path 自体がディレクトリか、root までの祖先にファイルがあるか
    async fn conflicts(&self, path: &Path) -> bool {
        if fs::metadata(path).await.is_ok_and(|m| m.is_dir()) {
            return true;
        }
        let mut dir = path.parent();
        while let Some(d) = dir {
            if d == self.root || !d.starts_with(&self.root) {
                break;
            }
            if fs::metadata(d).await.is_ok_and(|m| !m.is_dir()) {
                return true;
            }
            dir = d.parent();
        }
        false
    }
}

fn is_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory | io::ErrorKind::IsADirectory
    )
}

async fn write_atomically(path: &Path, tmp: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(tmp).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(tmp, path).await
}

#[async_trait]
impl ObjectStore for LocalFsObjectStore {
    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    async fn put(&self, key: &ObjectKey, payload: Payload) -> Result<PutResult, StorageError> {
        let path = self.path_for(key)?;

        let mut attempt = 1;
        loop {
            match self.try_put(key, &path, payload.as_bytes()).await {
                Ok(()) => break,
                Err(_) if self.conflicts(&path).await => {
                    return Err(StorageError::invalid_key(
                        key.as_str(),
                        "conflicts with an existing object",
                    ));
                }
                // 並行 delete がディレクトリを片付けた直後
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::NotFound | io::ErrorKind::AlreadyExists
                    ) && attempt < MAX_PUT_ATTEMPTS =>
                {
                    tracing::debug!(key = %key, attempt, "parent directory vanished, retrying");
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "write failed");
                    return Err(StorageError::from_io(key.as_str(), e));
                }
            }
        }

        tracing::debug!(key = %key, bytes = payload.len(), path = %path.display(), "stored object");
        Ok(PutResult::stored(key.clone(), self.signer.locator().url_for(key)))
    }

    async fn get(&self, key: &ObjectKey) -> Result<Option<Payload>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(buf) => Ok(Some(Payload::new(buf))),
            Err(e) if is_absent(&e) => Ok(None),
            Err(e) => Err(StorageError::from_io(key.as_str(), e)),
        }
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key = %key, "deleted object");
                self.prune_empty_parents(&path).await;
                Ok(())
            }
            Err(e) if is_absent(&e) => Ok(()),
            Err(e) => Err(StorageError::from_io(key.as_str(), e)),
        }
    }

    async fn exists(&self, key: &ObjectKey) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        self.is_stored(key, &path).await
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
