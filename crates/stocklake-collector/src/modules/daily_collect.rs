//! 일별 시세 수집 모듈.
//!
//! 벤더의 TIME_SERIES_DAILY 엔드포인트에서 심볼별 일봉을 수집하여
//! 하나의 CSV로 게시합니다. 동시성 전략은 설정으로 선택하며,
//! 증분 모드에서는 기존 게시본의 워터마크(최대 날짜) 이후 행만
//! 추가합니다.

use std::time::Instant;

use chrono::NaiveDate;

use stocklake_data::{DailyBar, DataTable, FetchOutcome};

use super::{publish, resolve_symbols};
use crate::config::ConcurrencyMode;
use crate::runner::{self, Strategy};
use crate::{CollectionStats, CollectorConfig, Result, RunContext};

/// 일별 시세 수집 실행.
pub async fn collect_daily(
    ctx: &RunContext,
    config: &CollectorConfig,
    symbols: Option<String>,
    incremental: bool,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    tracing::info!(incremental = incremental, "일별 시세 수집 시작");

    let target_symbols = resolve_symbols(ctx, config, symbols).await?;
    if target_symbols.is_empty() {
        tracing::warn!("수집할 심볼이 없습니다");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    // 증분 모드: 기존 게시본에서 워터마크 추출
    let existing = if incremental {
        let bucket = config.require_bucket()?;
        publish::load_published(ctx.store.as_ref(), bucket, &config.daily.object_key).await?
    } else {
        None
    };
    let watermark = existing.as_ref().and_then(|t| t.max_date("date"));
    if let Some(watermark) = watermark {
        tracing::info!(watermark = %watermark, "증분 워터마크 적용");
    }

    let strategy = strategy_of(config);
    tracing::info!(
        symbols = target_symbols.len(),
        strategy = ?strategy,
        "조회 실행"
    );

    let vendor = ctx.vendor.clone();
    let results = runner::run_all(&target_symbols, &strategy, |symbol| {
        let vendor = vendor.clone();
        async move { vendor.fetch_daily(&symbol).await }
    })
    .await;

    // 심볼별 결과 집계
    let mut table = DataTable::new();
    for (symbol, result) in results {
        stats.total += 1;
        match result {
            Ok(FetchOutcome::Found(bars)) => {
                let fresh = filter_after(bars, watermark);
                if fresh.is_empty() {
                    stats.empty += 1;
                    tracing::debug!(symbol = symbol, "워터마크 이후 신규 행 없음");
                } else {
                    stats.success += 1;
                    stats.total_rows += fresh.len();
                    for bar in &fresh {
                        table.push_row(bar.to_row(&symbol));
                    }
                    tracing::info!(symbol = symbol, rows = fresh.len(), "시세 수집 완료");
                }
            }
            Ok(FetchOutcome::Absent) => {
                stats.empty += 1;
                tracing::warn!(symbol = symbol, "시세 데이터 없음");
            }
            Err(e) => {
                stats.errors += 1;
                tracing::warn!(symbol = symbol, error = %e, "시세 조회 실패, 건너뜀");
            }
        }
    }

    if table.is_empty() {
        tracing::warn!("신규 행이 없어 게시를 건너뜁니다");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    // 증분 모드는 기존 행 ++ 신규 행의 합집합을 게시
    let combined = match existing {
        Some(existing_table) => existing_table.merge(table, &["ticker", "date"]),
        None => table,
    };

    let bucket = config.require_bucket()?;
    publish::publish(
        &combined,
        &config.storage.local_dir,
        ctx.store.as_ref(),
        bucket,
        &config.daily.object_key,
    )
    .await?;

    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// 설정에서 동시성 전략 결정.
fn strategy_of(config: &CollectorConfig) -> Strategy {
    match config.daily.mode {
        ConcurrencyMode::Sequential => Strategy::Sequential {
            delay: config.daily.request_delay(),
        },
        ConcurrencyMode::Pool => Strategy::WorkerPool {
            workers: config.daily.workers,
        },
        ConcurrencyMode::Gather => Strategy::Gather {
            max_connections: config.daily.max_connections,
        },
    }
}

/// 워터마크 이후 행만 남기기 (증분 필터).
fn filter_after(bars: Vec<DailyBar>, watermark: Option<NaiveDate>) -> Vec<DailyBar> {
    match watermark {
        Some(watermark) => bars.into_iter().filter(|b| b.date > watermark).collect(),
        None => bars,
    }
}
