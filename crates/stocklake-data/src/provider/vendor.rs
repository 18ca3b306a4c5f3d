//! 벤더 쿼리 API 클라이언트.
//!
//! `function` + `symbol` + `apikey` 쿼리 계약을 따르는 벤더에서
//! 기업 개요와 일별 시세를 수집합니다.
//!
//! # 응답 분류
//!
//! - **정상**: 기대하는 최상위 키가 존재하는 JSON
//! - **호출 한도 마커**: 빈 객체 또는 `Note`/`Information` 멤버 —
//!   HTTP 오류가 아니므로 긴 쿨다운 후 재시도
//! - **데이터 없음**: 기대 키가 빠진 정상 응답 — 오류가 아니며 재시도하지 않음
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use stocklake_data::provider::vendor::{FetchOutcome, VendorClient};
//!
//! let client = VendorClient::new("YOUR_API_KEY");
//! match client.fetch_daily("AAPL").await? {
//!     FetchOutcome::Found(bars) => println!("{}개 시세 수신", bars.len()),
//!     FetchOutcome::Absent => println!("데이터 없음"),
//! }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// 벤더 API 오류.
#[derive(Debug, Error)]
pub enum VendorError {
    #[error("HTTP 요청 실패: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP 상태 오류: {0}")]
    Status(reqwest::StatusCode),

    #[error("호출 한도 초과")]
    RateLimited,
}

/// 심볼 하나에 대한 조회 결과.
///
/// "데이터 없음"을 오류와 분리된 정상 결과로 표현합니다.
/// 기대 키가 빠진 응답은 `Absent`이며 재시도 대상이 아닙니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    /// 벤더가 데이터를 반환함
    Found(T),
    /// 벤더에 보고할 데이터가 없음
    Absent,
}

impl<T> FetchOutcome<T> {
    /// 데이터가 존재하는지 여부.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// 재시도 정책.
///
/// 백오프는 선형으로 증가합니다 (`attempt × base_delay`).
/// 호출 한도 마커는 벤더의 롤링 쿼터 때문에 별도의 긴 쿨다운을 사용합니다.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 선형 백오프 기본 딜레이
    pub base_delay: Duration,
    /// 호출 한도 마커 수신 시 쿨다운
    pub throttle_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            throttle_cooldown: Duration::from_secs(30),
        }
    }
}

/// 기업 개요 레코드.
///
/// 벤더가 반환하는 평탄한 필드 맵을 그대로 보존합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewRecord {
    /// 티커 코드
    pub symbol: String,
    /// 필드명 → 값 (키 오름차순)
    pub fields: BTreeMap<String, String>,
}

impl OverviewRecord {
    /// 결합 테이블용 행으로 변환.
    ///
    /// `Symbol` 컬럼이 먼저 오고 나머지 필드가 키 순서대로 이어집니다.
    pub fn into_row(self) -> Vec<(String, String)> {
        let mut row = Vec::with_capacity(self.fields.len() + 1);
        row.push(("Symbol".to_string(), self.symbol));
        for (name, value) in self.fields {
            if name != "Symbol" {
                row.push((name, value));
            }
        }
        row
    }
}

/// 일별 시세 바.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyBar {
    /// 일자
    pub date: NaiveDate,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 거래량
    pub volume: i64,
}

impl DailyBar {
    /// 결합 테이블용 행으로 변환 (티커 컬럼 포함).
    pub fn to_row(&self, ticker: &str) -> Vec<(String, String)> {
        vec![
            ("date".to_string(), self.date.format("%Y-%m-%d").to_string()),
            ("open".to_string(), self.open.to_string()),
            ("high".to_string(), self.high.to_string()),
            ("low".to_string(), self.low.to_string()),
            ("close".to_string(), self.close.to_string()),
            ("volume".to_string(), self.volume.to_string()),
            ("ticker".to_string(), ticker.to_string()),
        ]
    }
}

/// 벤더 쿼리 API 클라이언트.
#[derive(Clone)]
pub struct VendorClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

/// 일별 시세 원시 응답 행.
#[derive(Deserialize)]
struct RawDailyBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

impl VendorClient {
    /// 기본 벤더 URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://www.alphavantage.co";

    /// 일별 시세 응답의 기대 키.
    const DAILY_SERIES_KEY: &'static str = "Time Series (Daily)";

    /// 새로운 벤더 클라이언트 생성.
    ///
    /// # Arguments
    /// * `api_key` - 벤더 API 키
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("HTTP 클라이언트 생성 실패");
        Self::with_client(client, api_key, Self::DEFAULT_BASE_URL)
    }

    /// 외부에서 구성한 HTTP 클라이언트로 생성.
    ///
    /// 연결 수 상한이나 타임아웃을 호출자가 제어할 때 사용합니다.
    /// `base_url`은 테스트 시 목 서버 주소로 교체 가능합니다.
    pub fn with_client(
        client: reqwest::Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// 재시도 정책 교체.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// 기업 개요 조회.
    ///
    /// `Symbol` 키가 빠진 응답은 `Absent`로 분류하며 재시도하지 않습니다.
    pub async fn fetch_overview(
        &self,
        symbol: &str,
    ) -> Result<FetchOutcome<OverviewRecord>, VendorError> {
        let payload = self.query_with_retry("OVERVIEW", symbol).await?;

        let obj = match payload.as_object() {
            Some(obj) if obj.contains_key("Symbol") => obj,
            _ => {
                tracing::debug!(symbol = symbol, "개요 데이터 없음");
                return Ok(FetchOutcome::Absent);
            }
        };

        let fields: BTreeMap<String, String> = obj
            .iter()
            .map(|(k, v)| (k.clone(), value_to_cell(v)))
            .collect();

        Ok(FetchOutcome::Found(OverviewRecord {
            symbol: symbol.to_uppercase(),
            fields,
        }))
    }

    /// 일별 시세 조회.
    ///
    /// 시세는 날짜 오름차순으로 정규화되어 반환됩니다.
    /// `Time Series (Daily)` 키가 없거나 파싱 가능한 행이 없으면 `Absent`.
    pub async fn fetch_daily(
        &self,
        symbol: &str,
    ) -> Result<FetchOutcome<Vec<DailyBar>>, VendorError> {
        let payload = self.query_with_retry("TIME_SERIES_DAILY", symbol).await?;

        let bars = match parse_daily_series(&payload) {
            Some(bars) if !bars.is_empty() => bars,
            _ => {
                tracing::debug!(symbol = symbol, "일별 시세 데이터 없음");
                return Ok(FetchOutcome::Absent);
            }
        };

        Ok(FetchOutcome::Found(bars))
    }

    /// 재시도를 포함한 쿼리 실행.
    ///
    /// 일시적 오류(HTTP 오류, 타임아웃)는 선형 백오프로,
    /// 호출 한도 마커는 긴 쿨다운으로 재시도합니다.
    /// 최대 시도 횟수 소진 시 마지막 오류를 반환합니다.
    async fn query_with_retry(&self, function: &str, symbol: &str) -> Result<Value, VendorError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.query(function, symbol).await {
                Ok(payload) => return Ok(payload),
                Err(e) if attempt >= self.retry.max_attempts => {
                    tracing::warn!(
                        symbol = symbol,
                        function = function,
                        attempts = attempt,
                        error = %e,
                        "재시도 횟수 소진"
                    );
                    return Err(e);
                }
                Err(VendorError::RateLimited) => {
                    tracing::warn!(
                        symbol = symbol,
                        attempt = attempt,
                        cooldown_secs = self.retry.throttle_cooldown.as_secs_f64(),
                        "호출 한도 초과, 쿨다운 대기"
                    );
                    tokio::time::sleep(self.retry.throttle_cooldown).await;
                }
                Err(e) => {
                    tracing::debug!(
                        symbol = symbol,
                        attempt = attempt,
                        error = %e,
                        "일시적 오류, 재시도"
                    );
                    tokio::time::sleep(self.retry.base_delay * attempt).await;
                }
            }
        }
    }

    /// 단일 쿼리 실행.
    async fn query(&self, function: &str, symbol: &str) -> Result<Value, VendorError> {
        let url = format!("{}/query", self.base_url);

        tracing::debug!(function = function, symbol = symbol, "벤더 API 요청");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("function", function),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(VendorError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(VendorError::Status(response.status()));
        }

        let payload: Value = response.json().await?;

        // 빈 객체와 Note/Information 멤버는 벤더의 쿼터 초과 신호
        if is_throttle_marker(&payload) {
            return Err(VendorError::RateLimited);
        }

        Ok(payload)
    }
}

/// 호출 한도 마커 여부 판정.
fn is_throttle_marker(payload: &Value) -> bool {
    match payload.as_object() {
        Some(obj) => obj.is_empty() || obj.contains_key("Note") || obj.contains_key("Information"),
        None => false,
    }
}

/// 일별 시세 payload 파싱.
///
/// 기대 키가 없으면 `None`. 개별 행의 파싱 실패는 해당 행만 버립니다.
fn parse_daily_series(payload: &Value) -> Option<Vec<DailyBar>> {
    let series = payload.get(VendorClient::DAILY_SERIES_KEY)?;
    let raw: BTreeMap<String, RawDailyBar> = serde_json::from_value(series.clone()).ok()?;

    // BTreeMap 키 정렬로 날짜 오름차순이 보장됨
    let bars: Vec<DailyBar> = raw
        .into_iter()
        .filter_map(|(date, bar)| {
            Some(DailyBar {
                date: NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok()?,
                open: bar.open.parse().ok()?,
                high: bar.high.parse().ok()?,
                low: bar.low.parse().ok()?,
                close: bar.close.parse().ok()?,
                volume: bar.volume.parse().ok()?,
            })
        })
        .collect();

    Some(bars)
}

/// JSON 값을 CSV 셀 문자열로 변환.
fn value_to_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Instant;

    fn test_client(server: &mockito::ServerGuard, retry: RetryPolicy) -> VendorClient {
        let client = reqwest::Client::new();
        VendorClient::with_client(client, "demo", server.url()).with_retry_policy(retry)
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
            throttle_cooldown: Duration::from_millis(200),
        }
    }

    #[test]
    fn test_throttle_marker_detection() {
        assert!(is_throttle_marker(&json!({})));
        assert!(is_throttle_marker(&json!({"Note": "call frequency"})));
        assert!(is_throttle_marker(&json!({"Information": "premium"})));
        assert!(!is_throttle_marker(&json!({"Symbol": "AAPL"})));
        assert!(!is_throttle_marker(&json!(null)));
    }

    #[test]
    fn test_parse_daily_series_sorted_ascending() {
        let payload = json!({
            "Meta Data": {"2. Symbol": "AAPL"},
            "Time Series (Daily)": {
                "2024-01-12": {"1. open": "186.06", "2. high": "186.74", "3. low": "185.19", "4. close": "185.92", "5. volume": "40477782"},
                "2024-01-10": {"1. open": "184.35", "2. high": "186.40", "3. low": "183.92", "4. close": "186.19", "5. volume": "46792908"},
                "2024-01-11": {"1. open": "186.54", "2. high": "187.05", "3. low": "183.62", "4. close": "185.59", "5. volume": "49128408"}
            }
        });

        let bars = parse_daily_series(&payload).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(bars[2].date, NaiveDate::from_ymd_opt(2024, 1, 12).unwrap());
        assert_eq!(bars[0].close, "186.19".parse::<Decimal>().unwrap());
        assert_eq!(bars[0].volume, 46792908);
    }

    #[test]
    fn test_parse_daily_series_missing_key() {
        assert!(parse_daily_series(&json!({"Meta Data": {}})).is_none());
    }

    #[test]
    fn test_parse_daily_series_skips_malformed_rows() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-01-10": {"1. open": "184.35", "2. high": "186.40", "3. low": "183.92", "4. close": "186.19", "5. volume": "46792908"},
                "not-a-date": {"1. open": "1", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "1"}
            }
        });

        let bars = parse_daily_series(&payload).unwrap();
        assert_eq!(bars.len(), 1);
    }

    #[test]
    fn test_overview_row_starts_with_symbol_column() {
        let record = OverviewRecord {
            symbol: "AAPL".to_string(),
            fields: BTreeMap::from([
                ("Symbol".to_string(), "AAPL".to_string()),
                ("Name".to_string(), "Apple Inc".to_string()),
            ]),
        };
        let row = record.into_row();
        assert_eq!(row[0], ("Symbol".to_string(), "AAPL".to_string()));
        assert_eq!(row.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_payload_key_is_absent_without_retry() {
        let mut server = mockito::Server::new_async().await;
        // 기대 키가 없는 정상 응답은 재시도 없이 한 번만 호출되어야 함
        let mock = server
            .mock("GET", "/query")
            .match_query(mockito::Matcher::UrlEncoded(
                "symbol".into(),
                "AAPL".into(),
            ))
            .with_status(200)
            .with_body(r#"{"Meta Data": {}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server, fast_retry());
        let outcome = client.fetch_daily("AAPL").await.unwrap();

        assert_eq!(outcome, FetchOutcome::Absent);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_error_exhausts_bounded_retries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/query")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .expect(3)
            .create_async()
            .await;

        let client = test_client(&server, fast_retry());
        let result = client.fetch_daily("ZZZZ").await;

        assert!(matches!(result, Err(VendorError::Status(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_throttle_marker_waits_cooldown_and_bounds_attempts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/query")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"Note": "API call frequency exceeded"}"#)
            .expect(2)
            .create_async()
            .await;

        let retry = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(10),
            throttle_cooldown: Duration::from_millis(200),
        };
        let client = test_client(&server, retry);
        let started = Instant::now();
        let result = client.fetch_overview("AAPL").await;

        assert!(matches!(result, Err(VendorError::RateLimited)));
        // 첫 시도 후 쿨다운(200ms) 이상 대기했는지 확인
        assert!(started.elapsed() >= Duration::from_millis(200));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_overview_found_preserves_fields() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/query")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"Symbol": "MSFT", "Name": "Microsoft", "MarketCapitalization": "3000000000000"}"#)
            .create_async()
            .await;

        let client = test_client(&server, fast_retry());
        match client.fetch_overview("msft").await.unwrap() {
            FetchOutcome::Found(record) => {
                assert_eq!(record.symbol, "MSFT");
                assert_eq!(record.fields.get("Name").unwrap(), "Microsoft");
            }
            FetchOutcome::Absent => panic!("데이터가 있어야 함"),
        }
    }
}
