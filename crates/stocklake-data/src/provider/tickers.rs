//! 심볼 목록 소스.
//!
//! 수집 대상 티커 목록을 제공합니다:
//! - 정적 목록: 설정에 나열된 심볼 (실패하지 않음)
//! - 리스팅 API: 거래소별 페이지네이션 엔드포인트
//!   (`results` 배열 + `next_page_token`, 토큰이 없으면 종료)

use serde::Deserialize;

use crate::error::{DataError, Result};

/// 리스팅 API 소스 설정.
#[derive(Debug, Clone)]
pub struct ListingSourceConfig {
    /// 리스팅 엔드포인트 URL
    pub base_url: String,
    /// 리스팅 API 키
    pub api_key: String,
    /// 조회 대상 거래소 (예: NYSE, NASDAQ)
    pub exchanges: Vec<String>,
    /// 페이지당 최대 심볼 수
    pub page_limit: usize,
}

/// 심볼 목록 소스.
#[derive(Debug, Clone)]
pub enum TickerSource {
    /// 정적 심볼 목록
    Static(Vec<String>),
    /// 페이지네이션 리스팅 엔드포인트
    Listing(ListingSourceConfig),
}

/// 리스팅 응답 페이지.
#[derive(Deserialize)]
struct ListingPage {
    #[serde(default)]
    results: Vec<ListingEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// 리스팅 응답 항목.
#[derive(Deserialize)]
struct ListingEntry {
    ticker: String,
}

impl TickerSource {
    /// 심볼 목록 조회.
    ///
    /// 심볼은 대문자로 정규화됩니다. 정적 목록은 실패하지 않으며,
    /// 리스팅 소스는 아무 페이지도 가져오지 못했을 때만
    /// `SourceUnavailable`을 반환합니다.
    pub async fn list_symbols(&self, client: &reqwest::Client) -> Result<Vec<String>> {
        match self {
            Self::Static(symbols) => {
                let symbols: Vec<String> = symbols.iter().map(|s| s.to_uppercase()).collect();
                tracing::info!(count = symbols.len(), "정적 심볼 목록 로드");
                Ok(symbols)
            }
            Self::Listing(config) => Self::list_from_listing(client, config).await,
        }
    }

    /// 리스팅 엔드포인트 페이지네이션.
    ///
    /// 거래소별로 `page`를 증가시키며 조회하고, 응답에
    /// `next_page_token`이 없으면 해당 거래소 순회를 종료합니다.
    /// 중간 페이지 오류는 해당 거래소만 중단합니다.
    async fn list_from_listing(
        client: &reqwest::Client,
        config: &ListingSourceConfig,
    ) -> Result<Vec<String>> {
        let mut symbols: Vec<String> = Vec::new();
        let mut last_error: Option<String> = None;
        let limit = config.page_limit.to_string();

        for exchange in &config.exchanges {
            let mut page: u32 = 1;
            loop {
                let page_str = page.to_string();
                let response = client
                    .get(&config.base_url)
                    .query(&[
                        ("exchange", exchange.as_str()),
                        ("active", "true"),
                        ("limit", limit.as_str()),
                        ("page", page_str.as_str()),
                        ("apiKey", config.api_key.as_str()),
                    ])
                    .send()
                    .await;

                let parsed: ListingPage = match response {
                    Ok(resp) if resp.status().is_success() => match resp.json().await {
                        Ok(parsed) => parsed,
                        Err(e) => {
                            tracing::warn!(
                                exchange = exchange.as_str(),
                                page = page,
                                error = %e,
                                "리스팅 응답 파싱 실패, 거래소 순회 중단"
                            );
                            last_error = Some(e.to_string());
                            break;
                        }
                    },
                    Ok(resp) => {
                        tracing::warn!(
                            exchange = exchange.as_str(),
                            page = page,
                            status = %resp.status(),
                            "리스팅 조회 실패, 거래소 순회 중단"
                        );
                        last_error = Some(format!("HTTP {}", resp.status()));
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(
                            exchange = exchange.as_str(),
                            page = page,
                            error = %e,
                            "리스팅 요청 실패, 거래소 순회 중단"
                        );
                        last_error = Some(e.to_string());
                        break;
                    }
                };

                symbols.extend(parsed.results.into_iter().map(|e| e.ticker.to_uppercase()));

                if parsed.next_page_token.is_none() {
                    break;
                }
                page += 1;
            }
        }

        if symbols.is_empty() {
            if let Some(error) = last_error {
                return Err(DataError::SourceUnavailable(error));
            }
        }

        tracing::info!(count = symbols.len(), "리스팅 심볼 목록 조회 완료");
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source_uppercases_symbols() {
        let source = TickerSource::Static(vec!["aapl".to_string(), "Msft".to_string()]);
        let client = reqwest::Client::new();
        let symbols = source.list_symbols(&client).await.unwrap();
        assert_eq!(symbols, vec!["AAPL".to_string(), "MSFT".to_string()]);
    }

    #[tokio::test]
    async fn test_listing_paginates_until_token_absent() {
        let mut server = mockito::Server::new_async().await;
        // page=2 응답이 나중에 등록되어 먼저 매칭되므로 쿼리 조건으로 구분
        let page1 = server
            .mock("GET", "/v3/reference/tickers")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_body(r#"{"results": [{"ticker": "aapl"}, {"ticker": "msft"}], "next_page_token": "t2"}"#)
            .expect(1)
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/v3/reference/tickers")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_body(r#"{"results": [{"ticker": "goog"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let source = TickerSource::Listing(ListingSourceConfig {
            base_url: format!("{}/v3/reference/tickers", server.url()),
            api_key: "demo".to_string(),
            exchanges: vec!["NYSE".to_string()],
            page_limit: 1000,
        });
        let client = reqwest::Client::new();
        let symbols = source.list_symbols(&client).await.unwrap();

        assert_eq!(
            symbols,
            vec!["AAPL".to_string(), "MSFT".to_string(), "GOOG".to_string()]
        );
        page1.assert_async().await;
        page2.assert_async().await;
    }

    #[tokio::test]
    async fn test_listing_total_failure_is_source_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v3/reference/tickers")
            .with_status(500)
            .create_async()
            .await;

        let source = TickerSource::Listing(ListingSourceConfig {
            base_url: format!("{}/v3/reference/tickers", server.url()),
            api_key: "demo".to_string(),
            exchanges: vec!["NYSE".to_string(), "NASDAQ".to_string()],
            page_limit: 1000,
        });
        let client = reqwest::Client::new();
        let result = source.list_symbols(&client).await;

        assert!(matches!(result, Err(DataError::SourceUnavailable(_))));
    }
}
