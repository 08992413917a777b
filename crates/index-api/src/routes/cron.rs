//! 크론 트리거 증분 업데이트 endpoint.
//!
//! 외부 스케줄러가 주기적으로 호출합니다. 실행은 예산(기본 60초) 안에서
//! 끝나며, 예산이 소진되면 남은 섹터는 다음 호출에서 처리됩니다.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use index_collector::modules::{run_incremental, IncrementalOptions};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::auth::verify_bearer;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 크론 실행 결과.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_updated: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CronResponse {
    fn updated(records: usize) -> Self {
        Self {
            success: true,
            records_updated: Some(records),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            records_updated: None,
            error: Some(error.into()),
        }
    }
}

/// 증분 업데이트 실행.
///
/// GET|POST /api/cron/update-chart
///
/// `CRON_SECRET`이 설정되어 있으면 `Authorization: Bearer <secret>`이 필요합니다.
/// 섹터 단위 실패는 응답을 실패로 만들지 않으며, 저장소에 연결할 수 없을 때만 500입니다.
pub async fn update_chart(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<(StatusCode, Json<CronResponse>)> {
    if let Some(secret) = &state.cron_secret {
        if !verify_bearer(&headers, secret) {
            warn!("크론 요청 인증 실패");
            return Err(ApiErrorResponse::new("UNAUTHORIZED", "유효하지 않은 크론 시크릿입니다")
                .into_error(StatusCode::UNAUTHORIZED));
        }
    }

    let Some(_guard) = state.try_lock_pipeline() else {
        warn!("다른 파이프라인 실행 중, 크론 요청 거절");
        return Err(
            ApiErrorResponse::new("PIPELINE_BUSY", "다른 파이프라인 작업이 실행 중입니다")
                .into_error(StatusCode::CONFLICT),
        );
    };

    let options = IncrementalOptions {
        budget: (!state.cron_budget.is_zero()).then_some(state.cron_budget),
    };

    match run_incremental(state.store.clone(), state.source.as_ref(), &state.index, options).await
    {
        Ok(stats) => {
            stats.log_summary("크론 증분 업데이트");
            state.chart_cache.clear().await;
            info!(records = stats.records_updated(), "크론 업데이트 완료");
            Ok((
                StatusCode::OK,
                Json(CronResponse::updated(stats.records_updated())),
            ))
        }
        Err(e) => {
            error!(error = %e, "크론 증분 업데이트 실패");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CronResponse::failed(e.to_string())),
            ))
        }
    }
}

/// 크론 라우터 생성.
pub fn cron_router() -> Router<Arc<AppState>> {
    Router::new().route("/update-chart", get(update_chart).post(update_chart))
}
