//! resume-search - 이력서 하이브리드 검색 엔진
//!
//! 이력서(txt/md/json/pdf)를 임베딩해 SQLite 한 파일에 저장하고
//! 벡터 / FTS5 키워드 / 하이브리드(벡터 shortlist + 어휘 재정렬) 검색을 제공합니다.

pub mod cli;
pub mod collector;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod knowledge;

// Re-exports
pub use config::{get_data_dir, EmbeddingSettings, IngestSettings, SearchSettings, Settings};
pub use embedding::{EmbeddingProvider, OllamaEmbedding};
pub use error::{EmbeddingError, Error, ExtractionError, Result, StoreError};
pub use ingest::{IngestReport, IngestionJob, IngestionPipeline};
pub use knowledge::{
    NewResume, ResumeDocument, ResumeStore, Retriever, ScoredResult, SearchMethod, SearchRequest,
    SearchResponse, SqliteStore, StoreStats, UpsertOutcome, UpsertPolicy,
};
