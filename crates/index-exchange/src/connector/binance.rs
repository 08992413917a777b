//! Binance 캔들 커넥터.
//!
//! 공개 `/api/v3/klines` 엔드포인트만 사용하므로 인증이 필요 없습니다.

#![allow(dead_code)] // API 응답 필드 전체 매핑 (일부만 사용)

use async_trait::async_trait;
use index_core::{Candle, ExchangeConfig, Timeframe};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::traits::{ExchangeResult, KlineSource};
use crate::ExchangeError;

const KLINES_ENDPOINT: &str = "/api/v3/klines";

#[derive(Debug, Deserialize)]
struct BinanceKline(
    i64,    // 0: Open time
    String, // 1: Open
    String, // 2: High
    String, // 3: Low
    String, // 4: Close
    String, // 5: Volume
    i64,    // 6: Close time
    String, // 7: Quote asset volume
    i64,    // 8: Number of trades
    String, // 9: Taker buy base asset volume
    String, // 10: Taker buy quote asset volume
    String, // 11: Ignore
);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceError {
    code: i32,
    msg: String,
}

impl BinanceKline {
    fn into_candle(self) -> ExchangeResult<Candle> {
        let close = parse_number(&self.4, "close")?;
        let volume = parse_number(&self.5, "volume")?;
        Ok(Candle::new(self.0.div_euclid(1000), close, volume))
    }
}

fn parse_number(raw: &str, field: &str) -> ExchangeResult<f64> {
    raw.parse::<f64>()
        .map_err(|e| ExchangeError::ParseError(format!("{} '{}': {}", field, raw, e)))
}

/// Binance 캔들 클라이언트.
pub struct BinanceKlineClient {
    base_url: String,
    fallback_base_url: Option<String>,
    client: Client,
}

impl BinanceKlineClient {
    /// 새 클라이언트 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::NetworkError`를 반환합니다.
    pub fn new(config: &ExchangeConfig) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ExchangeError::NetworkError(format!("HTTP 클라이언트 생성 실패: {}", e))
            })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            fallback_base_url: config
                .fallback_base_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
            client,
        })
    }

    /// 파라미터에서 쿼리 문자열 생성.
    fn build_query(params: &[(&str, String)]) -> String {
        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// 공개 API 요청 (인증 불필요).
    async fn public_get<T: for<'de> Deserialize<'de>>(
        &self,
        base_url: &str,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<T> {
        let url = format!("{}{}", base_url, endpoint);
        let query = Self::build_query(params);

        let full_url = if query.is_empty() {
            url
        } else {
            format!("{}?{}", url, query)
        };

        debug!("GET {}", full_url);

        let response = self.client.get(&full_url).send().await?;

        self.handle_response(response).await
    }

    /// API 응답 처리.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> ExchangeResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::NetworkError(e.to_string()))?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| {
                error!("Failed to parse response: {} - Body: {}", e, body);
                ExchangeError::ParseError(e.to_string())
            })
        } else if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::IM_A_TEAPOT {
            Err(ExchangeError::RateLimited)
        } else if let Ok(error) = serde_json::from_str::<BinanceError>(&body) {
            Err(Self::map_error_code(error.code, &error.msg))
        } else {
            Err(ExchangeError::ApiError {
                code: status.as_u16() as i32,
                message: body,
            })
        }
    }

    /// Binance 에러 코드를 ExchangeError로 매핑.
    fn map_error_code(code: i32, msg: &str) -> ExchangeError {
        match code {
            -1000 => ExchangeError::Unknown(msg.to_string()),
            -1001 => ExchangeError::NetworkError(msg.to_string()),
            -1003 => ExchangeError::RateLimited,
            -1121 => ExchangeError::SymbolNotFound(msg.to_string()),
            _ => ExchangeError::ApiError {
                code,
                message: msg.to_string(),
            },
        }
    }

    async fn get_klines(
        &self,
        base_url: &str,
        symbol: &str,
        timeframe: Timeframe,
        limit: u32,
        end_time_ms: Option<i64>,
    ) -> ExchangeResult<Vec<Candle>> {
        let mut params = vec![
            ("symbol", symbol.to_uppercase()),
            ("interval", timeframe.to_binance_interval().to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(end) = end_time_ms {
            params.push(("endTime", end.to_string()));
        }

        let resp: Vec<BinanceKline> = self.public_get(base_url, KLINES_ENDPOINT, &params).await?;

        resp.into_iter().map(BinanceKline::into_candle).collect()
    }
}

#[async_trait]
impl KlineSource for BinanceKlineClient {
    fn name(&self) -> &str {
        "binance"
    }

    async fn fetch_page(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: u32,
        end_time_ms: Option<i64>,
    ) -> ExchangeResult<Vec<Candle>> {
        self.get_klines(&self.base_url, symbol, timeframe, limit, end_time_ms)
            .await
    }

    async fn fetch_recent(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: u32,
    ) -> ExchangeResult<Vec<Candle>> {
        let primary = self
            .get_klines(&self.base_url, symbol, timeframe, limit, None)
            .await;

        match (primary, &self.fallback_base_url) {
            (Err(e), Some(fallback)) if !matches!(e, ExchangeError::ParseError(_)) => {
                warn!(symbol, error = %e, fallback = %fallback, "주 엔드포인트 실패, 보조 엔드포인트로 재시도");
                self.get_klines(fallback, symbol, timeframe, limit, None)
                    .await
            }
            (result, _) => result,
        }
    }
}
