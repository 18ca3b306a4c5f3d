//! 데이터 Provider 모듈.
//!
//! 외부 API에서 데이터를 가져오는 Provider들을 정의합니다.
//!
//! ## 벤더 쿼리 API
//! - `VendorClient`: function + symbol + apikey 쿼리 계약 클라이언트
//! - 기업 개요(OVERVIEW), 일별 시세(TIME_SERIES_DAILY)
//! - 호출 한도 마커 감지 및 선형 백오프 재시도
//!
//! ## 심볼 소스
//! - `TickerSource`: 정적 목록 또는 페이지네이션 리스팅 API

pub mod tickers;
pub mod vendor;

pub use tickers::{ListingSourceConfig, TickerSource};
pub use vendor::{DailyBar, FetchOutcome, OverviewRecord, RetryPolicy, VendorClient, VendorError};
