//! resume-search CLI 진입점

use anyhow::{Context, Result};
use clap::Parser;

use resume_search::config::Settings;

fn main() -> Result<()> {
    // 로깅 초기화
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = resume_search::cli::Cli::parse();

    // 설정은 시작 시 한 번만 읽음
    let settings = Settings::from_env().context("설정 로드 실패")?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(resume_search::cli::run(cli, settings))
}
