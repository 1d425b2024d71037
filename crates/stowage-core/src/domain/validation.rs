//! Validation - 保存前の Payload 検査
//!
//! 検査結果は `Result` ではなく構造化された `ValidationResult` で返すため、
//! 呼び出し側はエラー処理なしで分岐できます。

use serde::{Deserialize, Serialize};

use crate::domain::payload::Payload;

/// Payload が無い、または空のときのメッセージ
pub const NO_DATA_PROVIDED: &str = "No data provided";

/// ValidationResult は検査結果
///
/// JSON では `{"valid":true}` / `{"valid":false,"error":"No data provided"}` になります。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// 存在チェックだけを行う既定のバリデーション
pub fn validate(payload: Option<&Payload>) -> ValidationResult {
    ValidationPolicy::default().validate(payload)
}

/// ValidationPolicy は存在チェックに加える任意のルール
///
/// # ルール（評価順）
/// 1. Payload が存在し、空でない
/// 2. `max_bytes` 以下
/// 3. `allowed_content_types` が空でなければ、content type が一致する
///    （`image/*` のようなワイルドカードは前方一致）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    #[serde(default)]
    pub max_bytes: Option<usize>,
    #[serde(default)]
    pub allowed_content_types: Vec<String>,
}

impl ValidationPolicy {
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn allow_content_type(mut self, pattern: impl Into<String>) -> Self {
        self.allowed_content_types.push(pattern.into());
        self
    }

    pub fn validate(&self, payload: Option<&Payload>) -> ValidationResult {
        let payload = match payload {
            Some(p) if !p.is_empty() => p,
            _ => return ValidationResult::invalid(NO_DATA_PROVIDED),
        };

        if let Some(max) = self.max_bytes
            && payload.len() > max
        {
            return ValidationResult::invalid(format!(
                "Payload exceeds maximum size of {max} bytes (got {})",
                payload.len()
            ));
        }

        if !self.allowed_content_types.is_empty() {
            let Some(content_type) = payload.content_type() else {
                return ValidationResult::invalid("Content type is required");
            };
            if !self.allows(content_type) {
                return ValidationResult::invalid(format!(
                    "Content type '{content_type}' is not allowed"
                ));
            }
        }

        ValidationResult::ok()
    }

    fn allows(&self, content_type: &str) -> bool {
        let content_type = content_type.trim().to_ascii_lowercase();
        self.allowed_content_types.iter().any(|pattern| {
            let pattern = pattern.trim().to_ascii_lowercase();
            match pattern.strip_suffix('*') {
                Some(prefix) => content_type.starts_with(prefix),
                None => content_type == pattern,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn absent_payload_is_invalid() {
        assert_eq!(
            validate(None),
            ValidationResult {
                valid: false,
                error: Some("No data provided".to_string()),
            }
        );
    }

    #[test]
    fn empty_payload_is_invalid() {
        let result = validate(Some(&Payload::new(Vec::new())));
        assert!(!result.valid);
        assert!(!result.error.unwrap().is_empty());
    }

    #[rstest]
    #[case::one_byte(vec![0u8])]
    #[case::text(b"hello".to_vec())]
    #[case::binary(vec![0x89, 0x50, 0x4e, 0x47])]
    fn non_empty_payload_is_valid(#[case] data: Vec<u8>) {
        assert_eq!(validate(Some(&Payload::new(data))), ValidationResult::ok());
    }

    #[test]
    fn size_limit_is_enforced() {
        let policy = ValidationPolicy::default().with_max_bytes(4);
        assert!(policy.validate(Some(&Payload::from("1234"))).valid);

        let result = policy.validate(Some(&Payload::from("12345")));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("maximum size of 4 bytes"));
    }

    #[rstest]
    #[case::wildcard_image("image/png", true)]
    #[case::wildcard_video("video/mp4", true)]
    #[case::case_insensitive("IMAGE/JPEG", true)]
    #[case::exact("application/pdf", true)]
    #[case::rejected("text/html", false)]
    fn content_type_allow_list(#[case] content_type: &str, #[case] expected: bool) {
        let policy = ValidationPolicy::default()
            .allow_content_type("image/*")
            .allow_content_type("video/*")
            .allow_content_type("application/pdf");
        let payload = Payload::from("x").with_content_type(content_type);
        assert_eq!(policy.validate(Some(&payload)).valid, expected);
    }

    #[test]
    fn missing_content_type_is_rejected_when_allow_list_is_set() {
        let policy = ValidationPolicy::default().allow_content_type("image/*");
        let result = policy.validate(Some(&Payload::from("x")));
        assert_eq!(result.error.as_deref(), Some("Content type is required"));
    }

    #[test]
    fn presence_is_checked_before_other_rules() {
        let policy = ValidationPolicy::default()
            .with_max_bytes(0)
            .allow_content_type("image/*");
        assert_eq!(policy.validate(None).error.as_deref(), Some(NO_DATA_PROVIDED));
    }

    #[test]
    fn result_serializes_without_null_error() {
        assert_eq!(
            serde_json::to_string(&ValidationResult::ok()).unwrap(),
            r#"{"valid":true}"#
        );
        assert_eq!(
            serde_json::to_string(&validate(None)).unwrap(),
            r#"{"valid":false,"error":"No data provided"}"#
        );
    }
}
