//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 심볼 소스 조회 실패 (리스팅 API 전체 실패)
    #[error("Symbol source unavailable: {0}")]
    SourceUnavailable(String),

    /// 오브젝트 스토리지 오류
    #[error("Object storage error: {0}")]
    Storage(String),

    /// CSV 직렬화/파싱 오류
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// 파일 입출력 오류
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, DataError>;
