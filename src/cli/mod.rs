//! CLI 모듈
//!
//! resume-search CLI 명령어 정의 및 구현

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::collector::{CollectorConfig, FileCollector};
use crate::config::{get_data_dir, Settings};
use crate::embedding::{EmbeddingProvider, OllamaEmbedding};
use crate::ingest::{IngestReport, IngestionJob, IngestionPipeline, UpsertPolicy};
use crate::knowledge::{
    short_preview, summarize_metadata, ResumeStore, Retriever, SearchRequest, SqliteStore,
};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "resume-search")]
#[command(version, about = "이력서 하이브리드 검색 엔진", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 폴더의 이력서를 저장소에 수집
    Ingest {
        /// 수집할 폴더 경로 (기본값: DATA_DIRECTORY)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// 이미 수집된 파일도 내용/임베딩 갱신
        #[arg(long)]
        replace: bool,

        /// 백그라운드 작업으로 실행
        #[arg(long)]
        background: bool,

        /// PDF 파일 건너뛰기
        #[arg(long)]
        skip_pdfs: bool,
    },

    /// 이력서 검색
    Search {
        /// 검색 쿼리
        query: String,

        /// 검색 방법 (vector, bm25, hybrid)
        #[arg(short, long)]
        method: Option<String>,

        /// 결과 개수 제한 (기본값: SEARCH_LIMIT)
        #[arg(short, long)]
        limit: Option<usize>,

        /// JSON으로 출력
        #[arg(long)]
        json: bool,
    },

    /// 저장된 이력서 목록
    List {
        /// 결과 개수 제한
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli, settings: Settings) -> Result<()> {
    match cli.command {
        Commands::Ingest {
            dir,
            replace,
            background,
            skip_pdfs,
        } => cmd_ingest(&settings, dir, replace, background, skip_pdfs).await,
        Commands::Search {
            query,
            method,
            limit,
            json,
        } => cmd_search(&settings, query, method, limit, json).await,
        Commands::List { limit } => cmd_list(&settings, limit),
        Commands::Status => cmd_status(&settings),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 수집 명령어 (ingest)
///
/// 폴더의 txt/md/json/pdf 이력서를 임베딩하여 저장합니다.
async fn cmd_ingest(
    settings: &Settings,
    dir: Option<PathBuf>,
    replace: bool,
    background: bool,
    skip_pdfs: bool,
) -> Result<()> {
    let dir = dir.unwrap_or_else(|| settings.ingest.data_directory.clone());
    let policy = if replace {
        UpsertPolicy::ReplaceExisting
    } else {
        settings.ingest.policy
    };

    let store = open_store(settings)?;
    let embedder = open_embedder(settings)?;

    let collector = FileCollector::new(CollectorConfig {
        skip_pdfs,
        ..Default::default()
    });
    let pipeline = IngestionPipeline::new(store, embedder.clone())
        .with_policy(policy)
        .with_collector(collector);

    println!("[*] 수집 중: {}", dir.display());
    println!("    모델: {} ({}차원)", embedder.name(), embedder.dimension());
    println!("    정책: {:?}", pipeline.policy());

    let report = if background {
        let job = IngestionJob::spawn(Arc::new(pipeline), dir);
        println!("[*] 백그라운드 작업 시작: {}", job.id());
        job.wait().await.context("수집 작업 실패")?
    } else {
        pipeline.ingest_directory(&dir).await
    };

    print_report(&report);
    Ok(())
}

/// 검색 명령어 (search)
async fn cmd_search(
    settings: &Settings,
    query: String,
    method: Option<String>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut search_settings = settings.search.clone();
    // 터미널 출력은 줄바꿈을 그대로 둠
    search_settings.html_preview = json;

    let retriever = Retriever::new(open_store(settings)?, open_embedder(settings)?, search_settings);

    let request = SearchRequest {
        query: Some(query),
        method,
        limit,
    };
    let response = retriever.handle(&request).await.context("검색 실패")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if response.results.is_empty() {
        println!("[!] 검색 결과가 없습니다.");
        return Ok(());
    }

    println!(
        "[OK] 검색 결과 ({} 건, {}):\n",
        response.results.len(),
        response.method
    );

    for (i, result) in response.results.iter().enumerate() {
        let score = result
            .similarity
            .map(|s| format!("{:.4}", s))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{}. [점수: {}] #{} {}",
            i + 1,
            score,
            result.candidate_id,
            result.file_name
        );
        println!("   메타데이터: {}", summarize_metadata(&result.metadata));
        println!("   내용: {}", truncate_text(&result.content_preview, 200));
        println!();
    }

    Ok(())
}

/// 목록 명령어 (list)
///
/// 최근 수집된 이력서부터 표시합니다.
fn cmd_list(settings: &Settings, limit: usize) -> Result<()> {
    let store = open_store(settings)?;
    let docs = store.list(limit).context("이력서 목록 조회 실패")?;

    if docs.is_empty() {
        println!("[!] 저장된 이력서가 없습니다.");
        return Ok(());
    }

    println!("[OK] 저장된 이력서 ({} 건):\n", docs.len());

    for doc in docs {
        println!("  #{:<4} {}", doc.id, doc.file_name);
        println!("        {}", short_preview(&doc.content));
        println!("        {}", summarize_metadata(&doc.metadata));
        println!(
            "        {} | {} chars",
            doc.created_at.format("%Y-%m-%d %H:%M"),
            doc.content.chars().count()
        );
        println!();
    }

    Ok(())
}

/// 상태 명령어 (status)
fn cmd_status(settings: &Settings) -> Result<()> {
    println!("resume-search v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 데이터 디렉토리: {}", get_data_dir().display());
    println!("[*] 이력서 폴더: {}", settings.ingest.data_directory.display());
    println!("[*] 저장소: {}", settings.database_path.display());
    println!(
        "[*] 임베딩: {} @ {} ({}차원)",
        settings.embedding.model, settings.embedding.base_url, settings.embedding.dimension
    );
    println!(
        "[*] 검색: limit {}, shortlist {}, lexical weight {}",
        settings.search.default_limit, settings.search.shortlist, settings.search.lexical_weight
    );
    println!("[*] 수집 정책: {:?}", settings.ingest.policy);

    match SqliteStore::open(&settings.database_path, settings.embedding.dimension) {
        Ok(store) => match store.stats() {
            Ok(stats) => {
                println!("[OK] 저장된 이력서: {} 건", stats.document_count);
                println!("     총 콘텐츠: {}", format_bytes(stats.total_content_bytes));
            }
            Err(e) => {
                println!("[!] 통계 조회 실패: {}", e);
            }
        },
        Err(e) => {
            println!("[!] 저장소 열기 실패: {}", e);
        }
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn open_store(settings: &Settings) -> Result<Arc<dyn ResumeStore>> {
    let store = SqliteStore::open(&settings.database_path, settings.embedding.dimension)
        .with_context(|| format!("저장소 열기 실패: {}", settings.database_path.display()))?;
    Ok(Arc::new(store))
}

fn open_embedder(settings: &Settings) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder = OllamaEmbedding::new(&settings.embedding).context("임베딩 클라이언트 생성 실패")?;
    Ok(Arc::new(embedder))
}

fn print_report(report: &IngestReport) {
    for error in &report.errors {
        eprintln!("[!] {}", error);
    }

    println!();
    println!(
        "[OK] 완료: 처리 {}, 건너뜀 {}, 실패 {}",
        report.processed,
        report.skipped,
        report.errors.len()
    );
}

/// 텍스트 자르기 (UTF-8 안전, 줄바꿈은 공백으로)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================
