//! 저장소 트레이트 및 벡터 유틸리티
//!
//! 랭킹 엔진과 수집 파이프라인은 `ResumeStore` 트레이트에만 의존합니다.
//! "거리순 k-최근접" + "full-text 랭크 검색" + "file_name 기준 upsert"를
//! 제공하는 저장소라면 어떤 엔진이든 대체할 수 있습니다.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::Serialize;

use super::store::{NewResume, ResumeDocument, StoreStats};
use crate::error::{Error, StoreError};

// ============================================================================
// Types
// ============================================================================

/// 최근접 검색 결과
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub document: ResumeDocument,
    /// 코사인 거리 (영벡터 등으로 정의되지 않으면 `None`)
    pub distance: Option<f64>,
}

impl Neighbor {
    /// `1 - distance` (음수도 그대로)
    pub fn similarity(&self) -> Option<f64> {
        self.distance.map(|d| 1.0 - d)
    }
}

/// full-text 랭크 검색 결과 (rank > 0 만)
#[derive(Debug, Clone)]
pub struct RankedMatch {
    pub document: ResumeDocument,
    pub rank: f64,
}

/// 같은 file_name이 이미 있을 때의 처리 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertPolicy {
    /// 먼저 수집된 것이 유지됨 (재실행 시 건드리지 않음)
    #[default]
    SkipExisting,
    /// 본문/메타데이터/임베딩을 제자리에서 교체 (id, created_at 유지)
    ReplaceExisting,
}

impl FromStr for UpsertPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" | "skip_existing" => Ok(UpsertPolicy::SkipExisting),
            "replace" | "replace_existing" => Ok(UpsertPolicy::ReplaceExisting),
            other => Err(Error::Config(format!(
                "unknown upsert policy {:?} (expected skip or replace)",
                other
            ))),
        }
    }
}

/// upsert 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(i64),
    Updated(i64),
    Skipped(i64),
}

impl UpsertOutcome {
    pub fn id(&self) -> i64 {
        match *self {
            UpsertOutcome::Created(id) | UpsertOutcome::Updated(id) | UpsertOutcome::Skipped(id) => id,
        }
    }

    /// processed 카운트에 포함되는지
    pub fn is_processed(&self) -> bool {
        !matches!(self, UpsertOutcome::Skipped(_))
    }
}

// ============================================================================
// ResumeStore Trait
// ============================================================================

/// 이력서 저장소 트레이트
pub trait ResumeStore: Send + Sync {
    /// 저장소가 요구하는 임베딩 차원
    fn dimension(&self) -> usize;

    /// 코사인 거리 오름차순 최근접 `limit`개
    fn nearest(&self, query: &[f32], limit: usize) -> Result<Vec<Neighbor>, StoreError>;

    /// full-text 랭크 내림차순 `limit`개 (rank == 0 제외)
    fn rank_full_text(&self, query: &str, limit: usize) -> Result<Vec<RankedMatch>, StoreError>;

    /// file_name 존재 여부
    fn contains(&self, file_name: &str) -> Result<bool, StoreError>;

    /// file_name 기준 upsert (본문+벡터를 한 트랜잭션으로 기록)
    fn upsert(&self, doc: &NewResume, policy: UpsertPolicy) -> Result<UpsertOutcome, StoreError>;

    fn get_by_file_name(&self, file_name: &str) -> Result<Option<ResumeDocument>, StoreError>;

    /// 최근 생성 순 목록
    fn list(&self, limit: usize) -> Result<Vec<ResumeDocument>, StoreError>;

    fn stats(&self) -> Result<StoreStats, StoreError>;
}

// ============================================================================
// Utility Functions
// ============================================================================

/// 코사인 거리 (1 - 코사인 유사도)
///
/// 길이가 다르거나 비어있거나 영벡터면 정의되지 않으므로 `None`.
/// 결과 범위는 0.0 ~ 2.0 입니다.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    Some(1.0 - dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// 거리 오름차순 비교 (정의되지 않은 거리는 뒤로)
pub fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// f32 벡터 → little-endian BLOB
pub fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// little-endian BLOB → f32 벡터 (길이가 4의 배수가 아니면 `None`)
pub fn decode_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}

// ============================================================================
// Tests
// ============================================================================
