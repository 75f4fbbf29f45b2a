//! 검색 결과 포맷터
//!
//! 매칭된 이력서를 응답 레코드로 변환합니다.
//! 미리보기는 문자(char) 단위로 자르므로 한글/이모지도 깨지지 않습니다.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::store::ResumeDocument;

/// 잘린 미리보기 끝에 붙는 표시
pub const ELLIPSIS: &str = "...";

/// 목록용 미리보기 길이
pub const SHORT_PREVIEW_CHARS: usize = 80;

/// 렌더링용 줄바꿈 토큰
pub const LINE_BREAK: &str = "<br>";

// ============================================================================
// Types
// ============================================================================

/// 검색 응답의 결과 한 건
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub candidate_id: i64,
    pub file_name: String,
    pub metadata: Map<String, Value>,
    pub content_preview: String,
    /// 벡터: 1 - distance, bm25: rank, hybrid: 결합 점수
    pub similarity: Option<f64>,
}

/// 미리보기 옵션
#[derive(Debug, Clone, Copy)]
pub struct PreviewOptions {
    pub max_chars: usize,
    /// 줄바꿈 연속 구간을 `<br>` 하나로 치환
    pub html_format: bool,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            max_chars: 300,
            html_format: true,
        }
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// 문서 → 응답 레코드
pub fn format_result(
    doc: &ResumeDocument,
    similarity: Option<f64>,
    options: PreviewOptions,
) -> ScoredResult {
    ScoredResult {
        candidate_id: doc.id,
        file_name: doc.file_name.clone(),
        metadata: doc.metadata.clone(),
        content_preview: content_preview(&doc.content, options),
        similarity,
    }
}

/// `max_chars`까지 자르고 (넘치면 `...`), 필요하면 줄바꿈을 치환
pub fn content_preview(content: &str, options: PreviewOptions) -> String {
    let preview = truncate_chars(content, options.max_chars);
    if options.html_format {
        newline_runs().replace_all(&preview, LINE_BREAK).into_owned()
    } else {
        preview
    }
}

/// 텍스트 자르기 (UTF-8 안전)
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ELLIPSIS),
        None => text.to_string(),
    }
}

/// 목록 표시용 한 줄 미리보기 (80자, 줄바꿈은 공백)
pub fn short_preview(content: &str) -> String {
    truncate_chars(content, SHORT_PREVIEW_CHARS).replace('\n', " ")
}

/// 목록 표시용 메타데이터 요약 (앞 3개 항목)
pub fn summarize_metadata(metadata: &Map<String, Value>) -> String {
    if metadata.is_empty() {
        return "{}".to_string();
    }

    let mut preview = metadata
        .iter()
        .take(3)
        .map(|(k, v)| match v {
            Value::String(s) => format!("{}: {}", k, s),
            other => format!("{}: {}", k, other),
        })
        .collect::<Vec<_>>()
        .join(", ");

    if metadata.len() > 3 {
        preview.push_str(", ...");
    }
    preview
}

fn newline_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n+").expect("valid newline regex"))
}

// ============================================================================
// Tests
// ============================================================================
