//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.

use axum::http::StatusCode;
use axum::Json;
use index_collector::CollectorError;
use index_core::IndexError;
use serde::{Deserialize, Serialize};

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "SECTOR_NOT_FOUND",
///   "message": "알 수 없는 섹터: FOO",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "STORE_ERROR", "INVALID_INPUT", "UNAUTHORIZED")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    pub timestamp: i64,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    ///
    /// # Example
    ///
    /// ```
    /// use index_api::error::ApiErrorResponse;
    ///
    /// let error = ApiErrorResponse::new("NOT_FOUND", "Sector not found");
    /// ```
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// 상태 코드와 묶어 핸들러 에러로 변환합니다.
    pub fn into_error(self, status: StatusCode) -> (StatusCode, Json<ApiErrorResponse>) {
        (status, Json(self))
    }

    /// 파이프라인 실행 에러를 HTTP 에러로 변환합니다.
    ///
    /// 잘못된 섹터 지정 같은 입력 에러는 400, 나머지는 500입니다.
    pub fn from_pipeline(err: &CollectorError) -> (StatusCode, Json<ApiErrorResponse>) {
        match err {
            CollectorError::Index(IndexError::InvalidInput(msg)) => {
                Self::new("INVALID_INPUT", msg.clone()).into_error(StatusCode::BAD_REQUEST)
            }
            CollectorError::Data(e) => {
                Self::new("STORE_ERROR", e.to_string()).into_error(StatusCode::INTERNAL_SERVER_ERROR)
            }
            other => Self::new("PIPELINE_ERROR", other.to_string())
                .into_error(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

#[cfg(test)]
mod tests {
    use super::*;
    use index_data::DataError;

    #[test]
    fn test_api_error_response_json() {
        let error = ApiErrorResponse::new("SECTOR_NOT_FOUND", "알 수 없는 섹터: FOO");
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["code"], "SECTOR_NOT_FOUND");
        assert_eq!(json["message"], "알 수 없는 섹터: FOO");
        assert!(json["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_from_pipeline_status_mapping() {
        let invalid = CollectorError::Index(IndexError::InvalidInput("알 수 없는 섹터: X".into()));
        let (status, Json(body)) = ApiErrorResponse::from_pipeline(&invalid);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "INVALID_INPUT");

        let store = CollectorError::Data(DataError::ConnectionError("refused".into()));
        let (status, Json(body)) = ApiErrorResponse::from_pipeline(&store);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "STORE_ERROR");
    }
}
