//! 임베딩 모듈 - Ollama API를 통한 텍스트 벡터화
//!
//! 텍스트를 고정 차원 벡터로 변환하는 임베딩 프로바이더입니다.
//! 수집과 검색이 같은 모델/차원을 써야 벡터끼리 비교할 수 있습니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = OllamaEmbedding::new(&settings.embedding)?;
//! let embedding = embedder.embed("Senior Rust engineer").await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingSettings;
use crate::error::EmbeddingError;

/// Ollama 임베딩 엔드포인트
/// ref: https://github.com/ollama/ollama/blob/main/docs/api.md#generate-embeddings
pub const EMBEDDINGS_ENDPOINT: &str = "/api/embeddings";

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 재시도는 하지 않습니다. 실패는 호출한 작업(파일 수집, 검색 요청)의 실패가 됩니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// 임베딩 차원 수
    fn dimension(&self) -> usize;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// Ollama Embedding
// ============================================================================

/// Ollama 임베딩 구현체
#[derive(Debug, Clone)]
pub struct OllamaEmbedding {
    client: reqwest::Client,
    endpoint: url::Url,
    model: String,
    dimension: usize,
    timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

impl OllamaEmbedding {
    /// 설정으로 생성
    ///
    /// 요청 타임아웃은 HTTP 클라이언트에 걸어 둡니다.
    pub fn new(settings: &EmbeddingSettings) -> Result<Self, EmbeddingError> {
        let endpoint = embeddings_url(&settings.base_url)?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("resume-search/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout())
            .build()
            .map_err(EmbeddingError::Client)?;

        Ok(Self {
            client,
            endpoint,
            model: settings.model.clone(),
            dimension: settings.dimension,
            timeout_secs: settings.timeout_secs,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let request = EmbedRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let embedding = parse_embedding(&body, &self.model, self.dimension)?;
        tracing::debug!(
            "Embedded {} chars with {} ({} dims)",
            text.len(),
            self.model,
            embedding.len()
        );
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model
    }
}

impl OllamaEmbedding {
    fn classify(&self, err: reqwest::Error) -> EmbeddingError {
        if err.is_timeout() {
            EmbeddingError::Timeout(self.timeout_secs)
        } else {
            EmbeddingError::Request(err)
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// base URL 뒤에 임베딩 엔드포인트를 붙입니다 (끝의 `/`는 무시)
pub fn embeddings_url(base_url: &str) -> Result<url::Url, EmbeddingError> {
    let joined = format!("{}{}", base_url.trim().trim_end_matches('/'), EMBEDDINGS_ENDPOINT);
    Ok(url::Url::parse(&joined)?)
}

/// 응답 본문에서 임베딩을 꺼내고 차원을 검증합니다
pub fn parse_embedding(
    body: &str,
    model: &str,
    dimension: usize,
) -> Result<Vec<f32>, EmbeddingError> {
    let response: EmbedResponse = serde_json::from_str(body).map_err(EmbeddingError::Decode)?;

    let embedding = match response.embedding {
        Some(values) if !values.is_empty() => values,
        _ => {
            return Err(EmbeddingError::Missing {
                model: model.to_string(),
            })
        }
    };

    if embedding.len() != dimension {
        return Err(EmbeddingError::DimensionMismatch {
            expected: dimension,
            actual: embedding.len(),
        });
    }

    Ok(embedding)
}

// ============================================================================
// Test Support
// ============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// 텍스트별로 미리 정해 둔 벡터를 돌려주는 임베딩
    pub struct StubEmbedding {
        dimension: usize,
        vectors: Mutex<HashMap<String, Vec<f32>>>,
        fail_on: Option<String>,
        calls: AtomicUsize,
    }

    impl StubEmbedding {
        pub fn new(dimension: usize) -> Self {
            Self {
                dimension,
                vectors: Mutex::new(HashMap::new()),
                fail_on: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with(self, text: &str, vector: Vec<f32>) -> Self {
            self.vectors.lock().unwrap().insert(text.to_string(), vector);
            self
        }

        /// 이 문자열을 포함한 텍스트는 서비스 에러로 처리
        pub fn failing_on(mut self, needle: &str) -> Self {
            self.fail_on = Some(needle.to_string());
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for StubEmbedding {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.trim().is_empty() {
                return Err(EmbeddingError::EmptyInput);
            }
            if let Some(ref needle) = self.fail_on {
                if text.contains(needle.as_str()) {
                    return Err(EmbeddingError::Status {
                        status: 500,
                        body: "stub failure".to_string(),
                    });
                }
            }
            let known = self.vectors.lock().unwrap().get(text).cloned();
            Ok(known.unwrap_or_else(|| {
                let mut v = vec![0.0; self.dimension];
                v[text.len() % self.dimension] = 1.0;
                v
            }))
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn name(&self) -> &str {
            "stub"
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
