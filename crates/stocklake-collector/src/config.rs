//! 환경변수 기반 설정 모듈.

use std::path::PathBuf;
use std::time::Duration;

use stocklake_data::provider::tickers::{ListingSourceConfig, TickerSource};
use stocklake_data::provider::vendor::RetryPolicy;

use crate::error::CollectorError;
use crate::Result;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 벤더 API 키 (필수)
    pub api_key: String,
    /// 벤더 API Base URL
    pub vendor_base_url: String,
    /// 저장소 설정
    pub storage: StorageConfig,
    /// 심볼 소스 설정
    pub tickers: TickerSourceConfig,
    /// 재시도 정책 설정
    pub retry: RetryConfig,
    /// 기업 개요 수집 설정
    pub overview: OverviewConfig,
    /// 일별 시세 수집 설정
    pub daily: DailyConfig,
}

/// 저장소 설정
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// 클라우드 리전
    pub region: String,
    /// 업로드 대상 버킷 (게시 시점까지 부재 허용)
    pub bucket: Option<String>,
    /// 로컬 출력 디렉터리
    pub local_dir: PathBuf,
}

/// 심볼 소스 설정
#[derive(Debug, Clone)]
pub struct TickerSourceConfig {
    /// 정적 심볼 목록 (쉼표로 구분)
    pub static_symbols: Vec<String>,
    /// 리스팅 엔드포인트 URL (설정 시 정적 목록보다 우선)
    pub listing_url: Option<String>,
    /// 리스팅 API 키
    pub listing_api_key: Option<String>,
    /// 조회 대상 거래소
    pub exchanges: Vec<String>,
    /// 페이지당 최대 심볼 수
    pub page_limit: usize,
}

/// 재시도 정책 설정
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 최대 시도 횟수
    pub max_attempts: u32,
    /// 선형 백오프 기본 딜레이 (밀리초)
    pub base_delay_ms: u64,
    /// 호출 한도 쿨다운 (초)
    pub throttle_cooldown_secs: u64,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

/// 기업 개요 수집 설정
#[derive(Debug, Clone)]
pub struct OverviewConfig {
    /// API 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
    /// 체크포인트 파일 경로 (삭제 시 전체 재수집)
    pub checkpoint_path: PathBuf,
    /// 게시 대상 오브젝트 키
    pub object_key: String,
}

/// 일별 시세 수집 설정
#[derive(Debug, Clone)]
pub struct DailyConfig {
    /// 동시성 전략
    pub mode: ConcurrencyMode,
    /// 워커 풀 크기 (pool 모드)
    pub workers: usize,
    /// 동시 연결 상한 (gather 모드)
    pub max_connections: usize,
    /// API 요청 간 딜레이 (밀리초, sequential 모드)
    pub request_delay_ms: u64,
    /// 증분 모드 기본값
    pub incremental: bool,
    /// 게시 대상 오브젝트 키
    pub object_key: String,
}

/// 동시성 전략 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyMode {
    /// 한 번에 하나씩, 고정 딜레이 (벤더 페이싱이 엄격할 때)
    Sequential,
    /// 고정 크기 워커 풀
    Pool,
    /// 전체 동시 실행, 동시 연결 수 상한
    Gather,
}

impl ConcurrencyMode {
    /// 문자열에서 파싱 (알 수 없는 값은 sequential)
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pool" => Self::Pool,
            "gather" => Self::Gather,
            _ => Self::Sequential,
        }
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    ///
    /// 벤더 API 키 부재는 즉시 실패입니다. 버킷/자격 증명 부재는
    /// 게시 시점까지 허용됩니다.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("ALPHAVANTAGE_API_KEY").map_err(|_| {
            CollectorError::Config(
                "ALPHAVANTAGE_API_KEY 환경변수가 설정되지 않았습니다".to_string(),
            )
        })?;

        Ok(Self {
            api_key,
            vendor_base_url: std::env::var("VENDOR_BASE_URL")
                .unwrap_or_else(|_| "https://www.alphavantage.co".to_string()),
            storage: StorageConfig {
                region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                bucket: std::env::var("S3_BUCKET_NAME").ok(),
                local_dir: PathBuf::from(
                    std::env::var("LOCAL_DATA_DIR").unwrap_or_else(|_| "./stock_data".to_string()),
                ),
            },
            tickers: TickerSourceConfig {
                static_symbols: env_var_list("TICKER_STATIC_LIST"),
                listing_url: std::env::var("TICKER_LISTING_URL").ok(),
                listing_api_key: std::env::var("TICKER_LISTING_API_KEY").ok(),
                exchanges: {
                    let exchanges = env_var_list("TICKER_EXCHANGES");
                    if exchanges.is_empty() {
                        vec!["NYSE".to_string(), "NASDAQ".to_string()]
                    } else {
                        exchanges
                    }
                },
                page_limit: env_var_parse("TICKER_PAGE_LIMIT", 1000),
            },
            retry: RetryConfig {
                max_attempts: env_var_parse("RETRY_MAX_ATTEMPTS", 3),
                base_delay_ms: env_var_parse("RETRY_BASE_DELAY_MS", 1000),
                throttle_cooldown_secs: env_var_parse("RETRY_THROTTLE_COOLDOWN_SECS", 30),
                request_timeout_secs: env_var_parse("REQUEST_TIMEOUT_SECS", 30),
            },
            overview: OverviewConfig {
                request_delay_ms: env_var_parse("OVERVIEW_REQUEST_DELAY_MS", 500),
                checkpoint_path: PathBuf::from(
                    std::env::var("OVERVIEW_CHECKPOINT_PATH")
                        .unwrap_or_else(|_| "./overview_checkpoint.json".to_string()),
                ),
                object_key: std::env::var("OVERVIEW_OBJECT_KEY")
                    .unwrap_or_else(|_| "company_overview.csv".to_string()),
            },
            daily: DailyConfig {
                mode: ConcurrencyMode::parse(
                    &std::env::var("DAILY_CONCURRENCY").unwrap_or_else(|_| "gather".to_string()),
                ),
                workers: env_var_parse("DAILY_WORKERS", 20),
                max_connections: env_var_parse("DAILY_MAX_CONNECTIONS", 100),
                request_delay_ms: env_var_parse("DAILY_REQUEST_DELAY_MS", 500),
                incremental: env_var_bool("DAILY_INCREMENTAL", false),
                object_key: std::env::var("DAILY_OBJECT_KEY")
                    .unwrap_or_else(|_| "combinedstockdata.csv".to_string()),
            },
        })
    }

    /// 게시 시점의 버킷 확인.
    pub fn require_bucket(&self) -> Result<&str> {
        self.storage.bucket.as_deref().ok_or_else(|| {
            CollectorError::Config("S3_BUCKET_NAME 환경변수가 설정되지 않았습니다".to_string())
        })
    }

    /// 벤더 클라이언트용 재시도 정책 변환.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            throttle_cooldown: Duration::from_secs(self.retry.throttle_cooldown_secs),
        }
    }
}

impl TickerSourceConfig {
    /// 설정에서 심볼 소스 결정.
    ///
    /// 리스팅 URL과 키가 모두 있으면 리스팅 소스, 아니면 정적 목록.
    /// 둘 다 없으면 설정 오류입니다.
    pub fn source(&self) -> Result<TickerSource> {
        if let (Some(url), Some(key)) = (&self.listing_url, &self.listing_api_key) {
            return Ok(TickerSource::Listing(ListingSourceConfig {
                base_url: url.clone(),
                api_key: key.clone(),
                exchanges: self.exchanges.clone(),
                page_limit: self.page_limit,
            }));
        }
        if !self.static_symbols.is_empty() {
            return Ok(TickerSource::Static(self.static_symbols.clone()));
        }
        Err(CollectorError::Config(
            "심볼 소스가 없습니다. TICKER_STATIC_LIST 또는 TICKER_LISTING_URL을 설정하세요"
                .to_string(),
        ))
    }
}

impl OverviewConfig {
    /// API 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl DailyConfig {
    /// API 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 bool 값 파싱
fn env_var_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

/// 환경변수에서 쉼표 구분 목록 파싱
fn env_var_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
