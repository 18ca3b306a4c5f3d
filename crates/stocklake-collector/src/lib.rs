//! Standalone stock data collector for StockLake.
//!
//! 이 crate는 벤더 API에서 주식 데이터를 수집하여 오브젝트 스토리지에
//! 게시하는 배치 바이너리를 제공합니다:
//! - 기업 개요 수집 (체크포인트 기반 재개 지원)
//! - 일별 시세 수집 (전체 갱신 또는 워터마크 증분)
//! - 순차/워커 풀/동시 연결 상한 동시성 전략

pub mod config;
pub mod context;
pub mod error;
pub mod modules;
pub mod runner;
pub mod stats;

pub use config::CollectorConfig;
pub use context::RunContext;
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
