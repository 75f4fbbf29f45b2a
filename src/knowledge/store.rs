//! Resume Store - rusqlite 기반 이력서 저장소
//!
//! 이력서 본문, 메타데이터(JSON), 임베딩(BLOB)을 한 행에 저장하고
//! FTS5로 키워드 랭크 검색, 코사인 거리로 최근접 검색을 제공합니다.
//! 저장 위치 기본값: ~/.resume-search/resumes.db

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{ffi, params, Connection, ErrorCode, OpenFlags, OptionalExtension, Row, TransactionBehavior};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::vector::{
    compare_distance, cosine_distance, decode_embedding, encode_embedding, Neighbor, RankedMatch,
    ResumeStore, UpsertOutcome, UpsertPolicy,
};
use crate::error::StoreError;

/// 다른 프로세스가 쓰기 잠금을 쥐고 있을 때 기다리는 시간
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const DOCUMENT_COLUMNS: &str =
    "id, file_name, content, metadata, embedding, created_at, updated_at";

/// FTS 테이블과 조인할 때 (`content` 컬럼 이름이 겹침)
const QUALIFIED_COLUMNS: &str = "resumes.id, resumes.file_name, resumes.content, \
     resumes.metadata, resumes.embedding, resumes.created_at, resumes.updated_at";

/// FTS 질의에서 버리는 영어 불용어
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "in", "is",
    "it", "of", "on", "or", "that", "the", "to", "was", "were", "with",
];

// ============================================================================
// Types
// ============================================================================

/// 저장된 이력서
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeDocument {
    pub id: i64,
    pub file_name: String,
    pub content: String,
    pub metadata: Map<String, Value>,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 새 이력서 입력용 구조체
#[derive(Debug, Clone)]
pub struct NewResume {
    pub file_name: String,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub embedding: Vec<f32>,
}

/// 저장소 통계
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub document_count: usize,
    pub total_content_bytes: usize,
    pub dimension: usize,
    pub db_path: Option<PathBuf>,
}

// ============================================================================
// SqliteStore
// ============================================================================

/// SQLite 이력서 저장소
///
/// 프로세스 내 동시 접근은 Mutex로, 프로세스 간 동시 쓰기는
/// WAL + busy_timeout + `BEGIN IMMEDIATE` + `UNIQUE(file_name)`으로 직렬화합니다.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    db_path: Option<PathBuf>,
    dimension: usize,
}

impl SqliteStore {
    /// 저장소 열기 (없으면 생성)
    ///
    /// # Arguments
    /// * `path` - DB 파일 경로
    /// * `dimension` - 설정된 임베딩 차원
    pub fn open(path: &Path, dimension: usize) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: Some(path.to_path_buf()),
            dimension,
        };

        store.initialize()?;
        Ok(store)
    }

    /// 메모리 DB (테스트/임시 용도)
    pub fn open_in_memory(dimension: usize) -> Result<Self, StoreError> {
        let store = Self {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
            db_path: None,
            dimension,
        };
        store.initialize()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|e| StoreError::Lock(e.to_string()))
    }

    /// 스키마 초기화
    fn initialize(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.busy_timeout(BUSY_TIMEOUT)?;
        let journal: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!("SQLite journal mode: {}", journal);

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS resumes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_name TEXT NOT NULL UNIQUE,
                content TEXT NOT NULL CHECK (length(content) > 0),
                metadata TEXT NOT NULL DEFAULT '{}',
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;

        // FTS5 가상 테이블 (키워드 랭크 검색용)
        // ref: https://www.sqlite.org/fts5.html#external_content_tables
        conn.execute_batch(
            r#"
            CREATE VIRTUAL TABLE IF NOT EXISTS resumes_fts USING fts5(
                content,
                content=resumes,
                content_rowid=id,
                tokenize='porter unicode61'
            );

            CREATE TRIGGER IF NOT EXISTS resumes_ai AFTER INSERT ON resumes BEGIN
                INSERT INTO resumes_fts(rowid, content) VALUES (new.id, new.content);
            END;

            CREATE TRIGGER IF NOT EXISTS resumes_ad AFTER DELETE ON resumes BEGIN
                INSERT INTO resumes_fts(resumes_fts, rowid, content)
                VALUES('delete', old.id, old.content);
            END;

            CREATE TRIGGER IF NOT EXISTS resumes_au AFTER UPDATE OF content ON resumes BEGIN
                INSERT INTO resumes_fts(resumes_fts, rowid, content)
                VALUES('delete', old.id, old.content);
                INSERT INTO resumes_fts(rowid, content) VALUES (new.id, new.content);
            END;
            "#,
        )?;

        // 차원은 DB 생성 시 고정됩니다
        let recorded: Option<String> = conn
            .query_row(
                "SELECT value FROM store_meta WHERE key = 'embedding_dimension'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match recorded.and_then(|v| v.parse::<usize>().ok()) {
            Some(existing) if existing != self.dimension => {
                return Err(StoreError::DimensionMismatch {
                    expected: existing,
                    actual: self.dimension,
                });
            }
            Some(_) => {}
            None => {
                conn.execute(
                    "INSERT OR REPLACE INTO store_meta (key, value) VALUES ('embedding_dimension', ?1)",
                    params![self.dimension.to_string()],
                )?;
            }
        }

        tracing::debug!("Resume store initialized at {:?}", self.db_path);
        Ok(())
    }

    fn validate(&self, doc: &NewResume) -> Result<(), StoreError> {
        if doc.content.trim().is_empty() {
            return Err(StoreError::EmptyContent {
                file_name: doc.file_name.clone(),
            });
        }
        if doc.embedding.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: doc.embedding.len(),
            });
        }
        Ok(())
    }

    fn fetch_by_id(conn: &Connection, id: i64) -> Result<Option<ResumeDocument>, StoreError> {
        let sql = format!("SELECT {} FROM resumes WHERE id = ?1", DOCUMENT_COLUMNS);
        Ok(conn.query_row(&sql, params![id], map_document).optional()?)
    }
}

impl ResumeStore for SqliteStore {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn nearest(&self, query: &[f32], limit: usize) -> Result<Vec<Neighbor>, StoreError> {
        if query.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if limit == 0 {
            return Ok(vec![]);
        }

        let conn = self.lock()?;

        // 1. 전체 벡터와 거리 계산 (동률은 file_name 순)
        let mut stmt = conn.prepare("SELECT id, embedding FROM resumes ORDER BY file_name")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?)))?;

        let mut scored: Vec<(i64, Option<f64>)> = Vec::new();
        for row in rows {
            let (id, blob) = row?;
            let embedding = decode_embedding(&blob).ok_or_else(|| StoreError::Corrupt {
                id,
                message: format!("embedding blob of {} bytes", blob.len()),
            })?;
            scored.push((id, cosine_distance(query, &embedding)));
        }

        scored.sort_by(|a, b| compare_distance(a.1, b.1));
        scored.truncate(limit);

        // 2. 상위 문서만 로드
        let mut neighbors = Vec::with_capacity(scored.len());
        for (id, distance) in scored {
            if let Some(document) = Self::fetch_by_id(&conn, id)? {
                neighbors.push(Neighbor { document, distance });
            }
        }

        Ok(neighbors)
    }

    /// FTS5 BM25 랭크 검색
    ///
    /// `bm25()`는 관련도가 높을수록 작은(음수) 값이므로 부호를 뒤집어 rank로 씁니다.
    /// ref: https://www.sqlite.org/fts5.html#the_bm25_function
    fn rank_full_text(&self, query: &str, limit: usize) -> Result<Vec<RankedMatch>, StoreError> {
        let fts_query = build_fts5_query(query);
        if fts_query.is_empty() || limit == 0 {
            return Ok(vec![]);
        }

        let conn = self.lock()?;

        let sql = format!(
            "SELECT {}, bm25(resumes_fts) AS score
             FROM resumes_fts
             JOIN resumes ON resumes.id = resumes_fts.rowid
             WHERE resumes_fts MATCH ?1
             ORDER BY score, resumes.file_name
             LIMIT ?2",
            QUALIFIED_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![fts_query, limit as i64], |row| {
            let document = map_document(row)?;
            let score: f64 = row.get(7)?;
            Ok(RankedMatch {
                document,
                rank: -score,
            })
        })?;

        let mut matches = Vec::new();
        for row in rows {
            let ranked = row?;
            // 결과는 rank 내림차순이므로 0 이하는 꼬리에만 있습니다
            if ranked.rank > 0.0 {
                matches.push(ranked);
            }
        }

        Ok(matches)
    }

    fn contains(&self, file_name: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM resumes WHERE file_name = ?1",
                params![file_name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// 한 `BEGIN IMMEDIATE` 트랜잭션 안에서 존재 확인 + 쓰기
    ///
    /// 쓰기 잠금을 먼저 잡으므로 다른 프로세스와 경합해도 같은 file_name 행은
    /// 하나만 남고, 진 쪽은 이미 생긴 행을 보고 skip/update로 수렴합니다.
    fn upsert(&self, doc: &NewResume, policy: UpsertPolicy) -> Result<UpsertOutcome, StoreError> {
        self.validate(doc)?;

        let metadata = serde_json::to_string(&doc.metadata)?;
        let blob = encode_embedding(&doc.embedding);
        let now = Utc::now().to_rfc3339();
        let conflict = |e: rusqlite::Error| map_conflict(e, &doc.file_name);

        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(conflict)?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM resumes WHERE file_name = ?1",
                params![doc.file_name],
                |row| row.get(0),
            )
            .optional()?;

        let outcome = match (existing, policy) {
            (Some(id), UpsertPolicy::SkipExisting) => UpsertOutcome::Skipped(id),
            (Some(id), UpsertPolicy::ReplaceExisting) => {
                tx.execute(
                    "UPDATE resumes
                     SET content = ?2, metadata = ?3, embedding = ?4, updated_at = ?5
                     WHERE id = ?1",
                    params![id, doc.content, metadata, blob, now],
                )
                .map_err(conflict)?;
                UpsertOutcome::Updated(id)
            }
            (None, _) => {
                tx.execute(
                    "INSERT INTO resumes (file_name, content, metadata, embedding, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    params![doc.file_name, doc.content, metadata, blob, now],
                )
                .map_err(conflict)?;
                UpsertOutcome::Created(tx.last_insert_rowid())
            }
        };

        tx.commit().map_err(conflict)?;

        match outcome {
            UpsertOutcome::Created(id) => tracing::info!("Added resume: {} (id={})", doc.file_name, id),
            UpsertOutcome::Updated(id) => tracing::info!("Updated resume: {} (id={})", doc.file_name, id),
            UpsertOutcome::Skipped(_) => {
                tracing::info!("Skipping {}; file already ingested", doc.file_name)
            }
        }

        Ok(outcome)
    }

    fn get_by_file_name(&self, file_name: &str) -> Result<Option<ResumeDocument>, StoreError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM resumes WHERE file_name = ?1", DOCUMENT_COLUMNS);
        Ok(conn.query_row(&sql, params![file_name], map_document).optional()?)
    }

    fn list(&self, limit: usize) -> Result<Vec<ResumeDocument>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM resumes ORDER BY created_at DESC, id DESC LIMIT ?1",
            DOCUMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let docs = stmt
            .query_map(params![limit as i64], map_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(docs)
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.lock()?;

        let (count, total_size): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(LENGTH(CAST(content AS BLOB))), 0) FROM resumes",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(StoreStats {
            document_count: count as usize,
            total_content_bytes: total_size as usize,
            dimension: self.dimension,
            db_path: self.db_path.clone(),
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// `DOCUMENT_COLUMNS` 순서의 행을 ResumeDocument로 변환
fn map_document(row: &Row<'_>) -> rusqlite::Result<ResumeDocument> {
    let id: i64 = row.get(0)?;

    let metadata_raw: String = row.get(3)?;
    let metadata: Map<String, Value> = serde_json::from_str(&metadata_raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    let blob: Vec<u8> = row.get(4)?;
    let embedding = decode_embedding(&blob).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Blob,
            format!("embedding blob of {} bytes for row {}", blob.len(), id).into(),
        )
    })?;

    Ok(ResumeDocument {
        id,
        file_name: row.get(1)?,
        content: row.get(2)?,
        metadata,
        embedding,
        created_at: parse_datetime(row.get::<_, String>(5)?),
        updated_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

/// 유니크 키 충돌과 잠금 타임아웃은 Conflict로 분류
fn map_conflict(err: rusqlite::Error, file_name: &str) -> StoreError {
    if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
        let unique = failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE;
        let busy = matches!(
            failure.code,
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
        );
        if unique || busy {
            tracing::warn!("Conflicting write for {}: {}", file_name, err);
            return StoreError::Conflict {
                file_name: file_name.to_string(),
            };
        }
    }
    StoreError::Sqlite(err)
}

/// RFC3339 문자열을 DateTime<Utc>로 파싱
fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// FTS5 질의 생성
///
/// 영숫자/`_`가 아닌 문자는 모두 단어 경계로 보고 (`python,django`, `node.js`),
/// 단어마다 따옴표로 감싸 AND로 묶습니다.
/// 불용어만 있는 질의는 빈 문자열이 됩니다.
/// ref: https://www.sqlite.org/fts5.html#full_text_query_syntax
pub fn build_fts5_query(query: &str) -> String {
    query
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .map(str::to_lowercase)
        .filter(|w| w.chars().any(|c| c.is_alphanumeric()))
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .map(|w| format!("\"{}\"", w))
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DIM: usize = 3;

    fn new_resume(file_name: &str, content: &str, embedding: Vec<f32>) -> NewResume {
        let mut metadata = Map::new();
        metadata.insert("source".to_string(), Value::from(file_name));
        NewResume {
            file_name: file_name.to_string(),
            content: content.to_string(),
            metadata,
            embedding,
        }
    }

    fn create_test_store() -> (TempDir, SqliteStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("test.db"), DIM).unwrap();
        (dir, store)
    }

    #[test]
    fn test_insert_and_get() {
        let (_dir, store) = create_test_store();

        let outcome = store
            .upsert(
                &new_resume("kim.txt", "Rust engineer", vec![1.0, 0.0, 0.0]),
                UpsertPolicy::SkipExisting,
            )
            .unwrap();
        assert!(matches!(outcome, UpsertOutcome::Created(id) if id > 0));

        let doc = store.get_by_file_name("kim.txt").unwrap().unwrap();
        assert_eq!(doc.content, "Rust engineer");
        assert_eq!(doc.embedding, vec![1.0, 0.0, 0.0]);
        assert_eq!(doc.metadata.get("source"), Some(&Value::from("kim.txt")));
        assert!(store.contains("kim.txt").unwrap());
        assert!(!store.contains("lee.txt").unwrap());
    }

    #[test]
    fn test_skip_existing_keeps_first() {
        let (_dir, store) = create_test_store();
        let first = new_resume("kim.txt", "first", vec![1.0, 0.0, 0.0]);
        let second = new_resume("kim.txt", "second", vec![0.0, 1.0, 0.0]);

        let created = store.upsert(&first, UpsertPolicy::SkipExisting).unwrap();
        let skipped = store.upsert(&second, UpsertPolicy::SkipExisting).unwrap();

        assert_eq!(skipped, UpsertOutcome::Skipped(created.id()));
        let doc = store.get_by_file_name("kim.txt").unwrap().unwrap();
        assert_eq!(doc.content, "first");
        assert_eq!(doc.embedding, vec![1.0, 0.0, 0.0]);
        assert_eq!(store.stats().unwrap().document_count, 1);
    }

    #[test]
    fn test_replace_existing_updates_in_place() {
        let (_dir, store) = create_test_store();
        let created = store
            .upsert(
                &new_resume("kim.txt", "java developer", vec![1.0, 0.0, 0.0]),
                UpsertPolicy::ReplaceExisting,
            )
            .unwrap();
        let before = store.get_by_file_name("kim.txt").unwrap().unwrap();

        let updated = store
            .upsert(
                &new_resume("kim.txt", "kotlin developer", vec![0.0, 1.0, 0.0]),
                UpsertPolicy::ReplaceExisting,
            )
            .unwrap();

        assert_eq!(updated, UpsertOutcome::Updated(created.id()));
        let after = store.get_by_file_name("kim.txt").unwrap().unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(after.content, "kotlin developer");
        assert_eq!(after.embedding, vec![0.0, 1.0, 0.0]);
        assert_eq!(store.stats().unwrap().document_count, 1);

        // FTS 인덱스도 갱신됨
        assert!(store.rank_full_text("java", 10).unwrap().is_empty());
        assert_eq!(store.rank_full_text("kotlin", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_wrong_dimension_and_empty_content() {
        let (_dir, store) = create_test_store();

        let err = store
            .upsert(&new_resume("a.txt", "text", vec![1.0]), UpsertPolicy::SkipExisting)
            .unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { expected: 3, actual: 1 }));

        let err = store
            .upsert(&new_resume("b.txt", "  ", vec![1.0, 0.0, 0.0]), UpsertPolicy::SkipExisting)
            .unwrap_err();
        assert!(matches!(err, StoreError::EmptyContent { .. }));
        assert_eq!(store.stats().unwrap().document_count, 0);
    }

    #[test]
    fn test_reopen_with_other_dimension_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dim.db");
        drop(SqliteStore::open(&path, 3).unwrap());

        assert!(SqliteStore::open(&path, 3).is_ok());
        assert!(matches!(
            SqliteStore::open(&path, 4),
            Err(StoreError::DimensionMismatch { expected: 3, actual: 4 })
        ));
    }

    #[test]
    fn test_nearest_orders_by_distance() {
        let store = SqliteStore::open_in_memory(2).unwrap();
        store
            .upsert(&new_resume("far.txt", "far", vec![-1.0, 0.0]), UpsertPolicy::SkipExisting)
            .unwrap();
        store
            .upsert(&new_resume("near.txt", "near", vec![1.0, 0.1]), UpsertPolicy::SkipExisting)
            .unwrap();
        store
            .upsert(&new_resume("zero.txt", "zero", vec![0.0, 0.0]), UpsertPolicy::SkipExisting)
            .unwrap();
        store
            .upsert(&new_resume("mid.txt", "mid", vec![0.0, 1.0]), UpsertPolicy::SkipExisting)
            .unwrap();

        let neighbors = store.nearest(&[1.0, 0.0], 10).unwrap();
        let names: Vec<&str> = neighbors.iter().map(|n| n.document.file_name.as_str()).collect();
        assert_eq!(names, vec!["near.txt", "mid.txt", "far.txt", "zero.txt"]);

        // 거리 2.0 → 유사도 -1.0 (클램프하지 않음)
        assert!((neighbors[2].similarity().unwrap() + 1.0).abs() < 1e-9);
        assert!(neighbors[3].distance.is_none());

        assert_eq!(store.nearest(&[1.0, 0.0], 2).unwrap().len(), 2);
        assert!(matches!(
            store.nearest(&[1.0], 2),
            Err(StoreError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_rank_full_text_filters_and_orders() {
        let store = SqliteStore::open_in_memory(DIM).unwrap();
        let e = vec![1.0, 0.0, 0.0];
        store
            .upsert(&new_resume("a.txt", "Python engineer. Python, Python and Django.", e.clone()), UpsertPolicy::SkipExisting)
            .unwrap();
        store
            .upsert(&new_resume("b.txt", "Java engineer with some Python scripting experience in large teams", e.clone()), UpsertPolicy::SkipExisting)
            .unwrap();
        store
            .upsert(&new_resume("c.txt", "Accountant", e.clone()), UpsertPolicy::SkipExisting)
            .unwrap();

        let results = store.rank_full_text("python", 10).unwrap();
        let names: Vec<&str> = results.iter().map(|r| r.document.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert!(results.iter().all(|r| r.rank > 0.0));
        assert!(results[0].rank >= results[1].rank);

        // 스테밍: engineers → engineer
        assert_eq!(store.rank_full_text("engineers", 10).unwrap().len(), 2);
        // 모든 단어가 매칭되어야 함
        assert_eq!(store.rank_full_text("python django", 10).unwrap().len(), 1);
        assert!(store.rank_full_text("haskell", 10).unwrap().is_empty());
        assert!(store.rank_full_text("the", 10).unwrap().is_empty());
        assert_eq!(store.rank_full_text("python", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_rank_full_text_splits_punctuation() {
        let store = SqliteStore::open_in_memory(DIM).unwrap();
        store
            .upsert(
                &new_resume("web.txt", "Python and Django developer, Node.js and React", vec![1.0, 0.0, 0.0]),
                UpsertPolicy::SkipExisting,
            )
            .unwrap();
        store
            .upsert(&new_resume("acct.txt", "Accountant", vec![0.0, 1.0, 0.0]), UpsertPolicy::SkipExisting)
            .unwrap();

        for query in ["python django", "python,django", "node.js", "Node.JS, react"] {
            let results = store.rank_full_text(query, 10).unwrap();
            assert_eq!(results.len(), 1, "query {:?}", query);
            assert_eq!(results[0].document.file_name, "web.txt");
        }
    }

    #[test]
    fn test_list_and_stats() {
        let (_dir, store) = create_test_store();
        for i in 0..3 {
            store
                .upsert(
                    &new_resume(&format!("cv{}.txt", i), "1234567890", vec![1.0, 0.0, 0.0]),
                    UpsertPolicy::SkipExisting,
                )
                .unwrap();
        }

        assert_eq!(store.list(2).unwrap().len(), 2);
        let stats = store.stats().unwrap();
        assert_eq!(stats.document_count, 3);
        assert_eq!(stats.total_content_bytes, 30);
        assert_eq!(stats.dimension, 3);
    }

    #[test]
    fn test_build_fts5_query() {
        assert_eq!(build_fts5_query("python engineer"), "\"python\" \"engineer\"");
        assert_eq!(build_fts5_query("  "), "");
        assert_eq!(build_fts5_query("c++ \"rust\":"), "\"c\" \"rust\"");
        assert_eq!(build_fts5_query("the and of"), "");
        assert_eq!(build_fts5_query("Senior, Go"), "\"senior\" \"go\"");
        assert_eq!(build_fts5_query("python,django"), "\"python\" \"django\"");
        assert_eq!(build_fts5_query("Node.js"), "\"node\" \"js\"");
        assert_eq!(build_fts5_query("full-stack"), "\"full\" \"stack\"");
    }

    #[test]
    fn test_concurrent_writers_single_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shared.db");
        drop(SqliteStore::open(&path, DIM).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let store = SqliteStore::open(&path, DIM).unwrap();
                    let doc = new_resume("same.txt", &format!("writer {}", i), vec![1.0, 0.0, 0.0]);
                    store.upsert(&doc, UpsertPolicy::SkipExisting)
                })
            })
            .collect();

        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let created = outcomes
            .iter()
            .filter(|o| matches!(o, Ok(UpsertOutcome::Created(_))))
            .count();
        assert_eq!(created, 1);
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, Ok(_) | Err(StoreError::Conflict { .. }))));

        let store = SqliteStore::open(&path, DIM).unwrap();
        assert_eq!(store.stats().unwrap().document_count, 1);
    }
}
