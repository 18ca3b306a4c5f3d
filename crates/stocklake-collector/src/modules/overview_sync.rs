//! 기업 개요 수집 모듈.
//!
//! 벤더의 OVERVIEW 엔드포인트에서 심볼별 펀더멘털을 수집하여
//! 하나의 CSV로 게시합니다. 벤더의 호출 쿼터가 엄격하므로 항상
//! 순차 실행이며, 파일 체크포인트로 중단/재개를 지원합니다.
//!
//! 재시도 소진으로 실패한 심볼도 체크포인트에 기록됩니다.
//! 재수집이 필요하면 체크포인트 파일을 삭제하세요.

use std::time::Instant;

use stocklake_data::{DataTable, FetchOutcome};

use super::checkpoint::CheckpointStore;
use super::{publish, resolve_symbols};
use crate::{CollectionStats, CollectorConfig, Result, RunContext};

/// 기업 개요 수집 실행.
pub async fn sync_overviews(
    ctx: &RunContext,
    config: &CollectorConfig,
    symbols: Option<String>,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    tracing::info!("기업 개요 수집 시작");

    let target_symbols = resolve_symbols(ctx, config, symbols).await?;
    if target_symbols.is_empty() {
        tracing::warn!("수집할 심볼이 없습니다");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    let mut checkpoint = CheckpointStore::load(&config.overview.checkpoint_path)?;

    let delay = config.overview.request_delay();
    let total = target_symbols.len();
    let mut table = DataTable::new();

    for (idx, symbol) in target_symbols.iter().enumerate() {
        stats.total += 1;

        if checkpoint.contains(symbol) {
            stats.skipped += 1;
            tracing::debug!(symbol = symbol, "이미 처리된 심볼, 건너뜀");
            continue;
        }

        tracing::debug!(
            symbol = symbol,
            progress = format!("{}/{}", idx + 1, total),
            "개요 조회"
        );

        match ctx.vendor.fetch_overview(symbol).await {
            Ok(FetchOutcome::Found(record)) => {
                stats.success += 1;
                table.push_row(record.into_row());
                tracing::info!(symbol = symbol, "개요 수집 완료");
            }
            Ok(FetchOutcome::Absent) => {
                stats.empty += 1;
                tracing::warn!(symbol = symbol, "개요 데이터 없음");
            }
            Err(e) => {
                stats.errors += 1;
                tracing::warn!(symbol = symbol, error = %e, "개요 조회 실패, 건너뜀");
            }
        }

        // 성공/실패 모두 처리 완료로 기록 (재개 시 재시도하지 않음)
        checkpoint.mark_done(symbol)?;

        // Rate limiting
        tokio::time::sleep(delay).await;
    }

    stats.total_rows = table.len();

    if table.is_empty() {
        tracing::warn!("수집된 개요가 없어 게시를 건너뜁니다");
    } else {
        let bucket = config.require_bucket()?;
        publish::publish(
            &table,
            &config.storage.local_dir,
            ctx.store.as_ref(),
            bucket,
            &config.overview.object_key,
        )
        .await?;
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}
