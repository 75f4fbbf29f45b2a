//! 에러 타입
//!
//! 추출 / 임베딩 / 저장소 / 검증 단계별 에러를 정의합니다.
//! 배치 수집은 파일 단위 에러를 모아서 보고하고,
//! 검색 요청은 첫 에러를 그대로 호출자에게 전달합니다.

use thiserror::Error;

/// 라이브러리 공통 Result
pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Top-level Error
// ============================================================================

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(StoreError),

    /// 동시 수집 중 file_name 유니크 키 충돌
    #[error("conflicting write for {file_name}")]
    Conflict { file_name: String },

    /// 잘못된 검색 요청 등
    #[error("{0}")]
    Validation(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { file_name } => Error::Conflict { file_name },
            other => Error::Store(other),
        }
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// 문서 추출 에러 (모든 variant가 파일명을 가집니다)
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("could not read {file_name}: {source}")]
    Io {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {file_name}: {source}")]
    Json {
        file_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected a JSON object in {file_name}")]
    NotAnObject { file_name: String },

    #[error("could not read PDF {file_name}: {message}")]
    Pdf { file_name: String, message: String },

    #[error("no extractable text found in {file_name}")]
    Empty { file_name: String },

    #[error("unsupported file type: {file_name}")]
    Unsupported { file_name: String },
}

impl ExtractionError {
    pub fn file_name(&self) -> &str {
        match self {
            ExtractionError::Io { file_name, .. }
            | ExtractionError::Json { file_name, .. }
            | ExtractionError::NotAnObject { file_name }
            | ExtractionError::Pdf { file_name, .. }
            | ExtractionError::Empty { file_name }
            | ExtractionError::Unsupported { file_name } => file_name,
        }
    }
}

// ============================================================================
// Embedding
// ============================================================================

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("invalid embedding service url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("embedding request timed out after {0}s")]
    Timeout(u64),

    #[error("embedding request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("embedding service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse embedding response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("no embedding returned for model {model}")]
    Missing { model: String },

    #[error("embedding dimension mismatch: received {actual} but expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("cannot embed empty text")]
    EmptyInput,
}

// ============================================================================
// Store
// ============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("corrupt row {id}: {message}")]
    Corrupt { id: i64, message: String },

    #[error("embedding dimension mismatch: received {actual} but store expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("refusing to store empty content for {file_name}")]
    EmptyContent { file_name: String },

    #[error("conflicting write for {file_name}")]
    Conflict { file_name: String },

    #[error("lock poisoned: {0}")]
    Lock(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_conflict_maps_to_conflict() {
        let err: Error = StoreError::Conflict {
            file_name: "a.txt".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Conflict { ref file_name } if file_name == "a.txt"));
    }

    #[test]
    fn test_store_error_stays_store() {
        let err: Error = StoreError::Lock("poisoned".to_string()).into();
        assert!(matches!(err, Error::Store(StoreError::Lock(_))));
    }

    #[test]
    fn test_extraction_error_display() {
        let err = ExtractionError::Empty {
            file_name: "blank.txt".to_string(),
        };
        assert_eq!(err.to_string(), "no extractable text found in blank.txt");
        assert_eq!(err.file_name(), "blank.txt");
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = EmbeddingError::DimensionMismatch {
            expected: 768,
            actual: 384,
        };
        assert_eq!(
            err.to_string(),
            "embedding dimension mismatch: received 384 but expected 768"
        );
    }
}
