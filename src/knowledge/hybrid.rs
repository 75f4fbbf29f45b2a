//! 하이브리드 검색 - 벡터 shortlist + 어휘 재정렬
//!
//! 세 가지 검색 방식을 제공합니다.
//! - vector: 코사인 거리 오름차순, 유사도 = 1 - distance
//! - bm25: FTS5 랭크 내림차순 (rank == 0 제외)
//! - hybrid: 넓은 벡터 후보(shortlist)를 질의어 출현 빈도로 재정렬
//!
//! hybrid 결합 점수:
//! `combined = base_similarity * (1 - w) + lexical_score * w`

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::preview::{format_result, PreviewOptions, ScoredResult};
use super::vector::{Neighbor, ResumeStore};
use crate::config::SearchSettings;
use crate::embedding::EmbeddingProvider;
use crate::error::{Error, Result};

/// 이보다 짧은 토큰은 어휘 점수에서 제외 (불용어 목록 대용)
const MIN_TERM_CHARS: usize = 3;

// ============================================================================
// Types
// ============================================================================

/// 검색 방법
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    /// 벡터 검색만 사용
    #[default]
    Vector,
    /// FTS5 키워드 랭크만 사용
    Bm25,
    /// 벡터 shortlist + 어휘 재정렬
    Hybrid,
}

impl SearchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMethod::Vector => "vector",
            SearchMethod::Bm25 => "bm25",
            SearchMethod::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "vector" => Ok(SearchMethod::Vector),
            "bm25" => Ok(SearchMethod::Bm25),
            "hybrid" => Ok(SearchMethod::Hybrid),
            other => Err(Error::Validation(format!("unknown search method: {}", other))),
        }
    }
}

/// 외부 HTTP 계층이 넘겨주는 검색 요청
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// 검색 응답
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<ScoredResult>,
    pub method: SearchMethod,
}

// ============================================================================
// Retriever
// ============================================================================

/// 검색기
///
/// 저장소와 임베딩 프로바이더는 트레이트 객체로 받습니다.
pub struct Retriever {
    store: Arc<dyn ResumeStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    settings: SearchSettings,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn ResumeStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            store,
            embedder,
            settings,
        }
    }

    /// 검색 요청 처리
    ///
    /// 빈 질의는 Validation 에러입니다. 결과 0건은 에러가 아닙니다.
    /// 알 수 없는 method는 vector로 처리합니다.
    pub async fn handle(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let query = request.query.as_deref().unwrap_or("").trim();
        if query.is_empty() {
            return Err(Error::Validation("Query is required.".to_string()));
        }

        let method = match request.method.as_deref() {
            None => SearchMethod::Vector,
            Some(raw) => raw.parse::<SearchMethod>().unwrap_or_else(|_| {
                tracing::warn!("Unknown search method {:?}, falling back to vector", raw);
                SearchMethod::Vector
            }),
        };

        let limit = request.limit.unwrap_or(self.settings.default_limit);
        let results = self.search(query, method, limit).await?;

        Ok(SearchResponse { results, method })
    }

    /// 지정한 방법으로 검색
    pub async fn search(
        &self,
        query: &str,
        method: SearchMethod,
        limit: usize,
    ) -> Result<Vec<ScoredResult>> {
        match method {
            SearchMethod::Vector => self.search_vector(query, limit).await,
            SearchMethod::Bm25 => self.search_bm25(query, limit),
            SearchMethod::Hybrid => self.search_hybrid(query, limit).await,
        }
    }

    /// 벡터 검색만 수행
    pub async fn search_vector(&self, query: &str, limit: usize) -> Result<Vec<ScoredResult>> {
        let query_embedding = self.embedder.embed(query).await?;
        let neighbors = self.store.nearest(&query_embedding, limit)?;

        Ok(neighbors
            .iter()
            .map(|n| format_result(&n.document, n.similarity(), self.preview_options()))
            .collect())
    }

    /// FTS5 랭크 검색만 수행
    pub fn search_bm25(&self, query: &str, limit: usize) -> Result<Vec<ScoredResult>> {
        let matches = self.store.rank_full_text(query, limit)?;

        Ok(matches
            .iter()
            .map(|m| format_result(&m.document, Some(m.rank), self.preview_options()))
            .collect())
    }

    /// 2단계 하이브리드 검색
    ///
    /// 1. `max(shortlist, limit)`개 벡터 후보
    /// 2. 질의어 출현 빈도로 재정렬 후 `limit`개
    pub async fn search_hybrid(&self, query: &str, limit: usize) -> Result<Vec<ScoredResult>> {
        let query_embedding = self.embedder.embed(query).await?;
        let shortlist = self.settings.shortlist.max(limit);
        let candidates = self.store.nearest(&query_embedding, shortlist)?;

        let terms = tokenize_terms(query);
        tracing::debug!(
            "Hybrid rerank: {} candidates, {} terms, weight {}",
            candidates.len(),
            terms.len(),
            self.settings.lexical_weight
        );

        Ok(rerank(&candidates, &terms, self.settings.lexical_weight, limit)
            .into_iter()
            .map(|(combined, neighbor)| {
                format_result(&neighbor.document, Some(combined), self.preview_options())
            })
            .collect())
    }

    fn preview_options(&self) -> PreviewOptions {
        PreviewOptions {
            max_chars: self.settings.preview_chars,
            html_format: self.settings.html_preview,
        }
    }
}

// ============================================================================
// Lexical Re-ranking
// ============================================================================

/// 질의 → 소문자 어휘 목록
///
/// 쉼표와 공백으로 나누고 2글자 이하 토큰은 버립니다.
pub fn tokenize_terms(query: &str) -> Vec<String> {
    query
        .replace(',', " ")
        .split_whitespace()
        .filter(|tok| tok.chars().count() >= MIN_TERM_CHARS)
        .map(|tok| tok.to_lowercase())
        .collect()
}

/// 본문에서 질의어 출현 횟수 합계 (대소문자 무시, 어간 처리 없음)
pub fn lexical_hits(content: &str, terms: &[String]) -> usize {
    if terms.is_empty() {
        return 0;
    }
    let lowered = content.to_lowercase();
    terms.iter().map(|term| lowered.matches(term.as_str()).count()).sum()
}

/// `min(1, hits / max(1, term_count))`
pub fn lexical_score(hits: usize, term_count: usize) -> f64 {
    (hits as f64 / term_count.max(1) as f64).min(1.0)
}

/// 고정 선형 결합
pub fn combine_score(base_similarity: f64, lexical: f64, lexical_weight: f64) -> f64 {
    base_similarity * (1.0 - lexical_weight) + lexical * lexical_weight
}

/// shortlist 재정렬 (안정 정렬, 동점이면 shortlist 순서 유지)
pub fn rerank<'a>(
    candidates: &'a [Neighbor],
    terms: &[String],
    lexical_weight: f64,
    limit: usize,
) -> Vec<(f64, &'a Neighbor)> {
    let mut scored: Vec<(f64, &Neighbor)> = candidates
        .iter()
        .map(|neighbor| {
            let base = neighbor.similarity().unwrap_or(0.0);
            let hits = lexical_hits(&neighbor.document.content, terms);
            let lexical = lexical_score(hits, terms.len());
            (combine_score(base, lexical, lexical_weight), neighbor)
        })
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}

// ============================================================================
// Tests
// ============================================================================
