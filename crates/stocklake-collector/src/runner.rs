//! 동시성 드라이버.
//!
//! 전체 심볼 목록을 받아 심볼마다 조회 결과를 돌려주는 공통 계약을
//! 세 가지 전략으로 제공합니다:
//!
//! - **Sequential**: 한 번에 하나씩, 호출 사이 고정 딜레이
//! - **WorkerPool**: 고정 크기 워커 풀, 완료 순서대로 수집
//! - **Gather**: 전체 동시 실행, 세마포어로 동시 연결 수 상한
//!
//! 어느 전략이든 개별 심볼의 실패는 결과 값으로 격리되며
//! 배치 전체를 중단시키지 않습니다.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;

use stocklake_data::{FetchOutcome, VendorError};

/// 동시성 전략.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// 순차 실행, 호출 간 고정 딜레이
    Sequential { delay: Duration },
    /// 고정 크기 워커 풀
    WorkerPool { workers: usize },
    /// 전체 동시 실행, 동시 연결 수 상한
    Gather { max_connections: usize },
}

/// 조회 결과. 오류도 값으로 반환되어 호출자가 통계로 분류합니다.
pub type SymbolResult<T> = (String, std::result::Result<FetchOutcome<T>, VendorError>);

/// 전체 심볼에 대해 조회 실행.
///
/// 반환 목록은 모든 심볼을 정확히 한 번씩 포함합니다.
/// WorkerPool 전략은 완료 순서이므로 입력 순서를 보장하지 않습니다.
pub async fn run_all<T, F, Fut>(symbols: &[String], strategy: &Strategy, fetch: F) -> Vec<SymbolResult<T>>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = std::result::Result<FetchOutcome<T>, VendorError>>,
{
    match strategy {
        Strategy::Sequential { delay } => {
            let mut results = Vec::with_capacity(symbols.len());
            for (idx, symbol) in symbols.iter().enumerate() {
                tracing::debug!(
                    symbol = symbol,
                    progress = format!("{}/{}", idx + 1, symbols.len()),
                    "조회 시작"
                );
                let result = fetch(symbol.clone()).await;
                results.push((symbol.clone(), result));

                // Rate limiting
                tokio::time::sleep(*delay).await;
            }
            results
        }
        Strategy::WorkerPool { workers } => {
            stream::iter(symbols.iter().map(|symbol| {
                let symbol = symbol.clone();
                let fut = fetch(symbol.clone());
                async move { (symbol, fut.await) }
            }))
            .buffer_unordered((*workers).max(1))
            .collect()
            .await
        }
        Strategy::Gather { max_connections } => {
            let semaphore = Arc::new(Semaphore::new((*max_connections).max(1)));
            join_all(symbols.iter().map(|symbol| {
                let symbol = symbol.clone();
                let semaphore = semaphore.clone();
                let fut = fetch(symbol.clone());
                async move {
                    let _permit = semaphore.acquire().await.expect("세마포어는 닫히지 않음");
                    (symbol, fut.await)
                }
            }))
            .await
        }
    }
}
