//! 수집 파이프라인
//!
//! 디렉토리의 이력서를 파일 단위로 추출 → 중복 확인 → 임베딩 → 저장합니다.
//! 파일 하나의 실패는 보고서에 기록되고 나머지 파일 처리는 계속됩니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::collector::{CollectedFile, FileCollector};
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::extractor::ResumeExtractor;
use crate::knowledge::{NewResume, ResumeStore};

pub use crate::knowledge::UpsertPolicy;

// ============================================================================
// Report
// ============================================================================

/// 한 번의 수집 실행 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// 새로 저장된 행 (replace 정책이면 갱신된 행 포함)
    pub processed: usize,
    /// 이미 수집되어 건너뛴 파일
    pub skipped: usize,
    /// `"Failed to ingest <file_name>: <cause>"` 형식
    pub errors: Vec<String>,
}

enum FileOutcome {
    Processed,
    Skipped,
}

// ============================================================================
// Ingestion Pipeline
// ============================================================================

/// 이력서 수집 파이프라인
pub struct IngestionPipeline {
    store: Arc<dyn ResumeStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    extractor: ResumeExtractor,
    collector: FileCollector,
    policy: UpsertPolicy,
}

impl IngestionPipeline {
    pub fn new(store: Arc<dyn ResumeStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            store,
            embedder,
            extractor: ResumeExtractor::new(),
            collector: FileCollector::default(),
            policy: UpsertPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: UpsertPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_collector(mut self, collector: FileCollector) -> Self {
        self.collector = collector;
        self
    }

    pub fn policy(&self) -> UpsertPolicy {
        self.policy
    }

    /// 디렉토리 전체 수집
    ///
    /// 전체 실패는 없습니다. 디렉토리가 없으면 에러 한 건짜리 보고서를 돌려줍니다.
    pub async fn ingest_directory(&self, dir: &Path) -> IngestReport {
        let mut report = IngestReport::default();

        let problem = if !dir.exists() {
            Some("does not exist")
        } else if !dir.is_dir() {
            Some("is not a directory")
        } else {
            None
        };
        if let Some(problem) = problem {
            let message = format!("Data directory {} {}", dir.display(), problem);
            tracing::error!("{}", message);
            report.errors.push(message);
            return report;
        }

        let files = self.collector.collect_directory(dir);
        tracing::info!(
            "Ingesting {} files from {} (policy={:?})",
            files.len(),
            dir.display(),
            self.policy
        );

        for file in &files {
            tracing::debug!("[{}] {}", file.file_type.label(), file.path.display());
            match self.ingest_file(file).await {
                Ok(FileOutcome::Processed) => report.processed += 1,
                Ok(FileOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    let message = format!("Failed to ingest {}: {}", file.file_name(), e);
                    tracing::error!("{}", message);
                    report.errors.push(message);
                }
            }
        }

        tracing::info!(
            "Ingestion finished: {} processed, {} skipped, {} errors",
            report.processed,
            report.skipped,
            report.errors.len()
        );
        report
    }

    /// 파일 하나 처리
    ///
    /// 임베딩을 먼저 만든 뒤 한 트랜잭션으로 저장하므로
    /// 임베딩 실패 시 아무것도 기록되지 않습니다.
    async fn ingest_file(&self, file: &CollectedFile) -> Result<FileOutcome> {
        let resume = self.extractor.extract(&file.path, file.file_type).await?;

        // skip 정책이면 임베딩 호출 전에 확인
        if self.policy == UpsertPolicy::SkipExisting && self.store.contains(&resume.file_name)? {
            tracing::info!("Skipping {}; file already ingested", resume.file_name);
            return Ok(FileOutcome::Skipped);
        }

        let embedding = self.embedder.embed(&resume.content).await?;

        let doc = NewResume {
            file_name: resume.file_name,
            content: resume.content,
            metadata: resume.metadata,
            embedding,
        };

        // 경합에서 진 skip 정책 쓰기는 Skipped로 수렴
        if self.store.upsert(&doc, self.policy)?.is_processed() {
            Ok(FileOutcome::Processed)
        } else {
            Ok(FileOutcome::Skipped)
        }
    }
}

// ============================================================================
// Background Job
// ============================================================================

/// 백그라운드 수집 작업 (tokio 태스크)
pub struct IngestionJob {
    id: Uuid,
    handle: JoinHandle<IngestReport>,
}

impl IngestionJob {
    /// 파이프라인을 별도 태스크에서 실행
    pub fn spawn(pipeline: Arc<IngestionPipeline>, dir: PathBuf) -> Self {
        let id = Uuid::new_v4();
        tracing::info!("Starting ingestion job {} for {}", id, dir.display());

        let handle = tokio::spawn(async move {
            let report = pipeline.ingest_directory(&dir).await;
            tracing::info!(
                "Ingestion completed by job {} with {} processed and {} errors",
                id,
                report.processed,
                report.errors.len()
            );
            report
        });

        Self { id, handle }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 작업 완료 대기
    pub async fn wait(self) -> std::result::Result<IngestReport, tokio::task::JoinError> {
        self.handle.await
    }
}

// ============================================================================
// Tests
// ============================================================================
