//! Payload - 保存するデータ本体

use serde::{Deserialize, Serialize};

/// Payload は任意のバイト列と、任意の content type
///
/// 「データなし」は `Option<Payload>` の `None` で表し、
/// 0 バイトの Payload は「空」として扱います（どちらもバリデーションで弾かれる）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    data: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
}

impl Payload {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for Payload {
    fn from(data: &[u8]) -> Self {
        Self::new(data)
    }
}

impl From<&str> for Payload {
    fn from(data: &str) -> Self {
        Self::new(data.as_bytes())
    }
}

impl From<String> for Payload {
    fn from(data: String) -> Self {
        Self::new(data.into_bytes())
    }
}
