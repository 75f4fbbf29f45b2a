//! JSON 이력서 추출
//!
//! 본문은 `content` → `resume_text` → 전체 payload 덤프 순으로 고르고,
//! 나머지 최상위 키는 모두 메타데이터로 보존합니다.

use serde_json::{Map, Value};

use crate::error::ExtractionError;

/// 본문으로 쓰는 필드 (우선순위 순)
const CONTENT_FIELDS: [&str; 2] = ["content", "resume_text"];

/// JSON 바이트에서 (본문, 메타데이터) 추출
pub fn extract_json(
    bytes: &[u8],
    file_name: &str,
) -> Result<(String, Map<String, Value>), ExtractionError> {
    let payload: Value = serde_json::from_slice(bytes).map_err(|source| ExtractionError::Json {
        file_name: file_name.to_string(),
        source,
    })?;

    let object = match payload {
        Value::Object(map) => map,
        _ => {
            return Err(ExtractionError::NotAnObject {
                file_name: file_name.to_string(),
            })
        }
    };

    let content = CONTENT_FIELDS
        .iter()
        .find_map(|field| match object.get(*field) {
            Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
            _ => None,
        });

    let content = match content {
        Some(text) => text,
        None => serde_json::to_string_pretty(&object).map_err(|source| ExtractionError::Json {
            file_name: file_name.to_string(),
            source,
        })?,
    };

    let metadata = object
        .into_iter()
        .filter(|(key, _)| !CONTENT_FIELDS.contains(&key.as_str()))
        .collect();

    Ok((content, metadata))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_field_wins() {
        let (content, metadata) = extract_json(
            br#"{"content": "Rust", "resume_text": "Go", "name": "Lee", "years": 7}"#,
            "a.json",
        )
        .unwrap();

        assert_eq!(content, "Rust");
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata.get("years"), Some(&Value::from(7)));
        assert!(!metadata.contains_key("resume_text"));
    }

    #[test]
    fn test_resume_text_fallback() {
        let (content, _) =
            extract_json(br#"{"content": "", "resume_text": "Kotlin"}"#, "a.json").unwrap();
        assert_eq!(content, "Kotlin");
    }

    #[test]
    fn test_pretty_dump_fallback() {
        let (content, metadata) =
            extract_json(br#"{"name": "Park", "skills": ["sql", "python"]}"#, "a.json").unwrap();

        assert!(content.contains("\"name\": \"Park\""));
        assert!(content.contains('\n'));
        assert_eq!(metadata.len(), 2);
    }

    #[test]
    fn test_invalid_json() {
        let err = extract_json(b"{not json", "bad.json").unwrap_err();
        assert!(matches!(err, ExtractionError::Json { .. }));
        assert_eq!(err.file_name(), "bad.json");
    }

    #[test]
    fn test_non_object_payload() {
        let err = extract_json(b"[1, 2, 3]", "list.json").unwrap_err();
        assert!(matches!(err, ExtractionError::NotAnObject { .. }));
    }
}
