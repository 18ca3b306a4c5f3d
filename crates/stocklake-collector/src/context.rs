//! 실행 컨텍스트.
//!
//! HTTP 클라이언트와 오브젝트 스토어를 실행당 한 번 명시적으로 생성하여
//! 워크플로우에 전달합니다. 수명은 한 번의 실행과 같으며, 실행 종료 시
//! 내부 연결 풀이 함께 해제됩니다.

use std::sync::Arc;
use std::time::Duration;

use stocklake_data::{ObjectStore, S3ObjectStore, VendorClient};

use crate::config::CollectorConfig;
use crate::error::CollectorError;
use crate::Result;

/// 한 번의 실행이 공유하는 클라이언트 묶음.
pub struct RunContext {
    /// 공용 HTTP 클라이언트 (벤더/리스팅 공유, 연결 풀 포함)
    pub http: reqwest::Client,
    /// 벤더 API 클라이언트
    pub vendor: VendorClient,
    /// 오브젝트 스토어
    pub store: Arc<dyn ObjectStore>,
}

impl RunContext {
    /// 설정에서 컨텍스트 구성 (S3 스토어 사용).
    pub async fn from_config(config: &CollectorConfig) -> Result<Self> {
        let store: Arc<dyn ObjectStore> =
            Arc::new(S3ObjectStore::from_env(&config.storage.region).await);
        Self::with_store(config, store)
    }

    /// 외부에서 주입한 스토어로 컨텍스트 구성 (테스트용).
    pub fn with_store(config: &CollectorConfig, store: Arc<dyn ObjectStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.retry.request_timeout_secs))
            .pool_max_idle_per_host(config.daily.max_connections)
            .build()
            .map_err(|e| CollectorError::Config(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        let vendor = VendorClient::with_client(
            http.clone(),
            config.api_key.as_str(),
            config.vendor_base_url.as_str(),
        )
        .with_retry_policy(config.retry_policy());

        Ok(Self { http, vendor, store })
    }
}
