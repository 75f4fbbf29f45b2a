//! 설정 모듈
//!
//! 프로세스 시작 시 환경변수에서 한 번 읽어 각 컴포넌트 생성자로 전달합니다.
//! 컴포넌트 내부에서 환경변수를 직접 읽지 않습니다.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::knowledge::UpsertPolicy;

/// 기본 임베딩 차원 (nomic-embed-text)
pub const DEFAULT_DIMENSION: usize = 768;

// ============================================================================
// Settings
// ============================================================================

/// 전체 설정
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub embedding: EmbeddingSettings,
    pub search: SearchSettings,
    pub ingest: IngestSettings,
    /// SQLite DB 파일 경로
    pub database_path: PathBuf,
}

/// 임베딩 서비스 설정
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingSettings {
    pub base_url: String,
    pub model: String,
    pub dimension: usize,
    pub timeout_secs: u64,
}

impl EmbeddingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimension: DEFAULT_DIMENSION,
            timeout_secs: 180,
        }
    }
}

/// 검색/랭킹 설정
#[derive(Debug, Clone, Serialize)]
pub struct SearchSettings {
    /// 기본 결과 개수
    pub default_limit: usize,
    /// 하이브리드 1단계 벡터 후보 수
    pub shortlist: usize,
    /// 하이브리드 결합 시 어휘 점수 가중치 (0.0 ~ 1.0)
    pub lexical_weight: f64,
    /// 미리보기 최대 문자 수
    pub preview_chars: usize,
    /// 줄바꿈을 `<br>`로 치환할지 여부
    pub html_preview: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            shortlist: 30,
            lexical_weight: 0.35,
            preview_chars: 300,
            html_preview: true,
        }
    }
}

/// 수집 설정
#[derive(Debug, Clone, Serialize)]
pub struct IngestSettings {
    /// 기본 이력서 디렉토리
    pub data_directory: PathBuf,
    pub policy: UpsertPolicy,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            data_directory: PathBuf::from("data"),
            policy: UpsertPolicy::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            embedding: EmbeddingSettings::default(),
            search: SearchSettings::default(),
            ingest: IngestSettings::default(),
            database_path: default_database_path(),
        }
    }
}

impl Settings {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 key 조회 함수로 설정 로드
    ///
    /// 값이 없거나 빈 문자열이면 기본값을 쓰고,
    /// 파싱할 수 없는 값은 설정 에러로 처리합니다.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Settings::default();

        let embedding = EmbeddingSettings {
            base_url: get("OLLAMA_BASE_URL").unwrap_or(defaults.embedding.base_url),
            model: get("OLLAMA_EMBED_MODEL").unwrap_or(defaults.embedding.model),
            dimension: parse_or(get("EMBEDDING_DIMENSION"), "EMBEDDING_DIMENSION", defaults.embedding.dimension)?,
            timeout_secs: parse_or(get("OLLAMA_REQUEST_TIMEOUT"), "OLLAMA_REQUEST_TIMEOUT", defaults.embedding.timeout_secs)?,
        };

        if embedding.dimension == 0 {
            return Err(Error::Config("EMBEDDING_DIMENSION must be positive".to_string()));
        }

        let search = SearchSettings {
            default_limit: parse_or(get("SEARCH_LIMIT"), "SEARCH_LIMIT", defaults.search.default_limit)?,
            shortlist: parse_or(get("SEARCH_SHORTLIST"), "SEARCH_SHORTLIST", defaults.search.shortlist)?,
            lexical_weight: parse_or(get("LEXICAL_WEIGHT"), "LEXICAL_WEIGHT", defaults.search.lexical_weight)?,
            ..defaults.search
        };

        if !(0.0..=1.0).contains(&search.lexical_weight) {
            return Err(Error::Config(format!(
                "LEXICAL_WEIGHT must be between 0 and 1, got {}",
                search.lexical_weight
            )));
        }

        let policy = match get("INGEST_POLICY") {
            Some(raw) => raw.parse::<UpsertPolicy>()?,
            None => defaults.ingest.policy,
        };

        let ingest = IngestSettings {
            data_directory: get("DATA_DIRECTORY")
                .map(PathBuf::from)
                .unwrap_or(defaults.ingest.data_directory),
            policy,
        };

        let database_path = get("RESUME_SEARCH_DB")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        tracing::debug!(
            "Loaded settings (model={}, dimension={}, db={:?})",
            embedding.model,
            embedding.dimension,
            database_path
        );

        Ok(Self {
            embedding,
            search,
            ingest,
            database_path,
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 데이터 디렉토리 경로 (~/.resume-search/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".resume-search")
}

fn default_database_path() -> PathBuf {
    get_data_dir().join("resumes.db")
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| Error::Config(format!("invalid {}={:?}: {}", key, value, e))),
        None => Ok(default),
    }
}

// ============================================================================
// Tests
// ============================================================================
