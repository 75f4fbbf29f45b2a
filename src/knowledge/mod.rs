//! Knowledge 모듈 - 이력서 저장소 + 검색
//!
//! - store: SQLite 한 파일에 본문/메타데이터/임베딩 저장 + FTS5 키워드 랭크
//! - vector: 저장소 트레이트, 코사인 거리, 임베딩 직렬화
//! - hybrid: vector / bm25 / hybrid 검색기
//! - preview: 검색 결과 레코드 포맷

mod store;
mod vector;
mod hybrid;
mod preview;

// Re-exports
pub use store::{build_fts5_query, NewResume, ResumeDocument, SqliteStore, StoreStats};
pub use vector::{
    compare_distance, cosine_distance, decode_embedding, encode_embedding, Neighbor,
    RankedMatch, ResumeStore, UpsertOutcome, UpsertPolicy,
};
pub use hybrid::{
    combine_score, lexical_hits, lexical_score, rerank, tokenize_terms, Retriever,
    SearchMethod, SearchRequest, SearchResponse,
};
pub use preview::{
    content_preview, format_result, short_preview, summarize_metadata, truncate_chars, PreviewOptions,
    ScoredResult,
};
