//! 에러 타입 정의.

use std::fmt;

use stocklake_data::DataError;

/// Collector 에러 타입
#[derive(Debug)]
pub enum CollectorError {
    /// 설정 에러
    Config(String),
    /// 데이터 소스 에러 (벤더 API, 리스팅 API)
    DataSource(String),
    /// 오브젝트 스토리지 에러 (게시 실패는 치명적)
    Storage(String),
    /// 파일 입출력 에러 (체크포인트, 로컬 CSV)
    Io(std::io::Error),
    /// JSON 직렬화 에러
    Serde(serde_json::Error),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::DataSource(msg) => write!(f, "Data source error: {}", msg),
            Self::Storage(msg) => write!(f, "Storage error: {}", msg),
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Serde(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {}

impl From<std::io::Error> for CollectorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for CollectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err)
    }
}

impl From<DataError> for CollectorError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::SourceUnavailable(msg) => Self::DataSource(msg),
            DataError::Storage(msg) => Self::Storage(msg),
            DataError::Csv(e) => Self::Storage(e.to_string()),
            DataError::Io(e) => Self::Io(e),
        }
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
