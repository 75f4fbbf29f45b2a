//! 콘텐츠 추출 모듈
//!
//! 이력서 파일에서 `(file_name, content, metadata)`를 추출합니다.
//! - 텍스트 파일: 직접 읽기 (디코딩할 수 없는 바이트는 치환)
//! - JSON 파일: `content` / `resume_text` 필드 또는 전체 덤프
//! - PDF 파일: pdf-extract로 페이지별 텍스트 추출

pub mod json;
pub mod pdf;

use std::path::Path;

use serde_json::{Map, Value};

use crate::collector::{file_name_of, FileType};
use crate::error::ExtractionError;

// ============================================================================
// Extracted Resume
// ============================================================================

/// 추출된 이력서
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedResume {
    /// 저장소 키 (경로의 파일 이름)
    pub file_name: String,
    /// 전체 텍스트 (비어있지 않음)
    pub content: String,
    /// 추출기별 메타데이터
    pub metadata: Map<String, Value>,
}

// ============================================================================
// Resume Extractor
// ============================================================================

/// 확장자별 추출기 디스패처
#[derive(Debug, Clone, Default)]
pub struct ResumeExtractor;

impl ResumeExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 경로의 확장자로 타입을 판별해 추출
    pub async fn extract_path(&self, path: &Path) -> Result<ExtractedResume, ExtractionError> {
        let file_type = FileType::from_path(path).ok_or_else(|| ExtractionError::Unsupported {
            file_name: file_name_of(path),
        })?;
        self.extract(path, file_type).await
    }

    /// 파일에서 이력서 추출
    pub async fn extract(
        &self,
        path: &Path,
        file_type: FileType,
    ) -> Result<ExtractedResume, ExtractionError> {
        let file_name = file_name_of(path);

        let (content, metadata) = match file_type {
            FileType::Text => self.extract_text(path, &file_name).await?,
            FileType::Json => {
                let bytes = read_bytes(path, &file_name).await?;
                json::extract_json(&bytes, &file_name)?
            }
            FileType::Pdf => self.extract_pdf(path, &file_name).await?,
        };

        if content.trim().is_empty() {
            return Err(ExtractionError::Empty { file_name });
        }

        Ok(ExtractedResume {
            file_name,
            content,
            metadata,
        })
    }

    async fn extract_text(
        &self,
        path: &Path,
        file_name: &str,
    ) -> Result<(String, Map<String, Value>), ExtractionError> {
        let bytes = read_bytes(path, file_name).await?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        Ok((content, source_metadata(file_name)))
    }

    async fn extract_pdf(
        &self,
        path: &Path,
        file_name: &str,
    ) -> Result<(String, Map<String, Value>), ExtractionError> {
        let bytes = read_bytes(path, file_name).await?;

        // PDF 파싱은 CPU 바운드이므로 spawn_blocking 사용
        let owned_name = file_name.to_string();
        let extracted = tokio::task::spawn_blocking(move || pdf::extract_pdf(&bytes, &owned_name))
            .await
            .map_err(|e| ExtractionError::Pdf {
                file_name: file_name.to_string(),
                message: format!("extraction task failed: {}", e),
            })??;

        let mut metadata = source_metadata(file_name);
        metadata.insert("page_count".to_string(), Value::from(extracted.page_count));
        Ok((extracted.text, metadata))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

async fn read_bytes(path: &Path, file_name: &str) -> Result<Vec<u8>, ExtractionError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| ExtractionError::Io {
            file_name: file_name.to_string(),
            source,
        })
}

/// `{source: file_name}`
fn source_metadata(file_name: &str) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("source".to_string(), Value::String(file_name.to_string()));
    metadata
}

// ============================================================================
// Tests
// ============================================================================
