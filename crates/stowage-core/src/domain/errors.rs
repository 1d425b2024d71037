//! Errors - ストレージ操作のエラー型と分類
//!
//! バリデーション失敗はエラーではなく `ValidationResult` で返します。
//! ここで扱うのはバックエンド操作（put/get/delete/exists/signed_url）の失敗です。

use std::io;

/// ErrorKind はストレージエラーの分類
///
/// # 分類
/// - NotFound: key が存在しない
/// - PermissionDenied: バックエンドが操作を拒否した
/// - Unavailable: バックエンドの障害（リトライで回復しうる）
/// - InvalidKey: key がバックエンドの名前空間で表現できない
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    Unavailable,
    InvalidKey,
}

/// StorageError はストレージ操作のエラー
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: key={key}")]
    NotFound { key: String },

    #[error("permission denied: key={key}: {reason}")]
    PermissionDenied { key: String, reason: String },

    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },
}

impl StorageError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn permission_denied(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// IO エラーを key の文脈付きで分類
    pub fn from_io(key: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::not_found(key),
            io::ErrorKind::PermissionDenied => Self::permission_denied(key, err.to_string()),
            _ => Self::Unavailable {
                message: format!("io error on key={key}"),
                source: Some(Box::new(err)),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::Unavailable { .. } => ErrorKind::Unavailable,
            Self::InvalidKey { .. } => ErrorKind::InvalidKey,
        }
    }

    /// 同じ操作を再試行して成功しうるか
    ///
    /// 自動リトライはしません。呼び出し側の判断材料です。
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::not_found(io::ErrorKind::NotFound, ErrorKind::NotFound)]
    #[case::denied(io::ErrorKind::PermissionDenied, ErrorKind::PermissionDenied)]
    #[case::other(io::ErrorKind::Other, ErrorKind::Unavailable)]
    #[case::interrupted(io::ErrorKind::Interrupted, ErrorKind::Unavailable)]
    fn io_errors_are_classified(#[case] io_kind: io::ErrorKind, #[case] expected: ErrorKind) {
        let err = StorageError::from_io("a.png", io::Error::new(io_kind, "boom"));
        assert_eq!(err.kind(), expected);
    }

    #[test]
    fn only_unavailable_is_retryable() {
        assert!(StorageError::unavailable("down").is_retryable());
        assert!(!StorageError::not_found("a").is_retryable());
        assert!(!StorageError::permission_denied("a", "ro").is_retryable());
        assert!(!StorageError::invalid_key("", "empty").is_retryable());
    }

    #[test]
    fn unavailable_keeps_io_source() {
        use std::error::Error;

        let err = StorageError::from_io("a.png", io::Error::other("disk gone"));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("a.png"));
    }
}
