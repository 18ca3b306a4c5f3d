//! 주식 데이터 수집 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - 벤더 API 클라이언트 (기업 개요, 일별 시세)
//! - 심볼 목록 소스 (정적 목록, 페이지네이션 리스팅 API)
//! - 컬럼 합집합 기반 테이블 (`DataTable`) 및 CSV 직렬화
//! - 오브젝트 스토리지 추상화 (S3, 인메모리)

pub mod dataset;
pub mod error;
pub mod provider;
pub mod storage;

pub use dataset::DataTable;
pub use error::{DataError, Result};

// Provider 재내보내기
pub use provider::tickers::{ListingSourceConfig, TickerSource};
pub use provider::vendor::{
    DailyBar, FetchOutcome, OverviewRecord, RetryPolicy, VendorClient, VendorError,
};

// 저장소 타입 재내보내기
pub use storage::object_store::{MemoryObjectStore, ObjectStore, S3ObjectStore};
