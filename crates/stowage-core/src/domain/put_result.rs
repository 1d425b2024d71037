//! PutResult - put 成功時の返り値

use serde::{Deserialize, Serialize};

use crate::domain::key::ObjectKey;

/// 書き込み成功の結果
///
/// `key` は put に渡した key そのもの、`url` は無期限の locator。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutResult {
    pub success: bool,
    pub url: String,
    pub key: ObjectKey,
}

impl PutResult {
    pub fn stored(key: ObjectKey, url: String) -> Self {
        Self {
            success: true,
            url,
            key,
        }
    }
}
