//! 거래소 에러 타입.

use serde::Serialize;
use thiserror::Error;

/// 거래소 관련 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 요청 한도 초과
    #[error("Rate limit exceeded")]
    RateLimited,

    /// API 에러 코드 (Binance 에러 코드 또는 HTTP 상태 코드)
    #[error("API error {code}: {message}")]
    ApiError { code: i32, message: String },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 심볼을 찾을 수 없음
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 알 수 없는 에러
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// 페이지 조회 실패의 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchFailure {
    /// 네트워크, 타임아웃, 요청 한도, 5xx
    Transient,
    /// 4xx 또는 거래소 에러 코드 (예: 존재하지 않는 심볼)
    Rejected,
    /// 응답 본문 파싱 실패
    Malformed,
}

impl ExchangeError {
    /// 재시도 가능한 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        self.failure_kind() == FetchFailure::Transient
    }

    /// 에러를 조회 실패 분류로 변환.
    pub fn failure_kind(&self) -> FetchFailure {
        match self {
            ExchangeError::NetworkError(_)
            | ExchangeError::RateLimited
            | ExchangeError::Timeout(_)
            | ExchangeError::Unknown(_) => FetchFailure::Transient,
            ExchangeError::ApiError { code, .. } if *code >= 500 => FetchFailure::Transient,
            ExchangeError::ApiError { .. } | ExchangeError::SymbolNotFound(_) => {
                FetchFailure::Rejected
            }
            ExchangeError::ParseError(_) => FetchFailure::Malformed,
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout(err.to_string())
        } else if err.is_connect() {
            ExchangeError::NetworkError(err.to_string())
        } else {
            ExchangeError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind() {
        assert_eq!(
            ExchangeError::NetworkError("reset".into()).failure_kind(),
            FetchFailure::Transient
        );
        assert_eq!(ExchangeError::RateLimited.failure_kind(), FetchFailure::Transient);
        assert_eq!(
            ExchangeError::ApiError { code: 503, message: "unavailable".into() }.failure_kind(),
            FetchFailure::Transient
        );
        assert_eq!(
            ExchangeError::ApiError { code: 451, message: "restricted".into() }.failure_kind(),
            FetchFailure::Rejected
        );
        assert_eq!(
            ExchangeError::ApiError { code: -1100, message: "bad param".into() }.failure_kind(),
            FetchFailure::Rejected
        );
        assert_eq!(
            ExchangeError::SymbolNotFound("FOOUSDT".into()).failure_kind(),
            FetchFailure::Rejected
        );
        assert_eq!(
            ExchangeError::ParseError("eof".into()).failure_kind(),
            FetchFailure::Malformed
        );
    }

    #[test]
    fn test_retryable() {
        assert!(ExchangeError::Timeout("30s".into()).is_retryable());
        assert!(!ExchangeError::SymbolNotFound("X".into()).is_retryable());
    }
}
