//! 데이터 수집 워크플로우 모듈.

pub mod checkpoint;
pub mod daily_collect;
pub mod overview_sync;
pub mod publish;

pub use checkpoint::CheckpointStore;
pub use daily_collect::collect_daily;
pub use overview_sync::sync_overviews;

use crate::config::CollectorConfig;
use crate::context::RunContext;
use crate::Result;

/// 수집 대상 심볼 목록 결정.
///
/// CLI 재정의(쉼표 구분)가 있으면 그것을, 없으면 설정된 심볼 소스를
/// 사용합니다. 심볼은 대문자로 정규화됩니다.
pub(crate) async fn resolve_symbols(
    ctx: &RunContext,
    config: &CollectorConfig,
    symbols: Option<String>,
) -> Result<Vec<String>> {
    match symbols {
        Some(ref s) => {
            let syms: Vec<String> = s
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            tracing::info!(count = syms.len(), "특정 심볼 수집");
            Ok(syms)
        }
        None => {
            let source = config.tickers.source()?;
            let syms = source.list_symbols(&ctx.http).await?;
            tracing::info!(count = syms.len(), "심볼 소스 조회 완료");
            Ok(syms)
        }
    }
}
