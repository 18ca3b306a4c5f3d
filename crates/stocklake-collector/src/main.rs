//! Standalone data collector CLI.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stocklake_collector::{modules, CollectorConfig, RunContext};

#[derive(Parser)]
#[command(name = "stocklake-collector")]
#[command(about = "StockLake Standalone Data Collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 기업 개요 수집 (체크포인트 기반 재개 지원)
    CollectOverview {
        /// 특정 심볼만 수집 (쉼표로 구분, 예: "AAPL,MSFT")
        #[arg(long)]
        symbols: Option<String>,
    },

    /// 일별 시세 수집
    CollectDaily {
        /// 특정 심볼만 수집 (쉼표로 구분)
        #[arg(long)]
        symbols: Option<String>,

        /// 증분 모드 (기존 게시본의 워터마크 이후 행만 추가)
        #[arg(long)]
        incremental: bool,
    },

    /// 전체 워크플로우 실행 (기업 개요 → 일별 시세)
    RunAll,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("stocklake_collector={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("StockLake Data Collector 시작");

    // 설정 로드 (벤더 API 키 부재는 여기서 즉시 실패)
    let config = CollectorConfig::from_env()?;
    tracing::debug!(
        region = config.storage.region.as_str(),
        bucket = ?config.storage.bucket,
        "설정 로드 완료"
    );

    // 실행 컨텍스트 구성 (HTTP 클라이언트 + 오브젝트 스토어)
    let ctx = RunContext::from_config(&config).await?;

    // 명령 실행
    match cli.command {
        Commands::CollectOverview { symbols } => {
            let stats = modules::sync_overviews(&ctx, &config, symbols).await?;
            stats.log_summary("기업 개요 수집");
        }
        Commands::CollectDaily {
            symbols,
            incremental,
        } => {
            let incremental = incremental || config.daily.incremental;
            let stats = modules::collect_daily(&ctx, &config, symbols, incremental).await?;
            stats.log_summary("일별 시세 수집");
        }
        Commands::RunAll => {
            tracing::info!("=== 전체 워크플로우 시작 ===");

            // 1. 기업 개요 수집
            tracing::info!("Step 1/2: 기업 개요 수집");
            let overview_stats = modules::sync_overviews(&ctx, &config, None).await?;
            overview_stats.log_summary("기업 개요 수집");

            // 2. 일별 시세 수집
            tracing::info!("Step 2/2: 일별 시세 수집");
            let daily_stats =
                modules::collect_daily(&ctx, &config, None, config.daily.incremental).await?;
            daily_stats.log_summary("일별 시세 수집");

            tracing::info!("=== 전체 워크플로우 완료 ===");
        }
    }

    tracing::info!("StockLake Data Collector 종료");

    Ok(())
}
