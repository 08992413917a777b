//! 관리자 백필 endpoint.
//!
//! 전체 이력을 다시 수집해 기준값과 인덱스를 재계산합니다. 기존 행은 삭제하지 않고
//! 키 기준으로 덮어씁니다. 전체 삭제는 CLI `--truncate`로만 가능합니다.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use index_collector::modules::{run_backfill, BackfillOptions};
use index_collector::PipelineStats;
use serde::Deserialize;
use tracing::{error, warn};

use crate::auth::verify_bearer;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 백필 요청 파라미터.
#[derive(Debug, Default, Deserialize)]
pub struct BackfillQuery {
    /// 대상 섹터 (쉼표 구분, 없으면 전체 + 컴포지트)
    pub sectors: Option<String>,
}

impl BackfillQuery {
    fn sector_list(&self) -> Option<Vec<String>> {
        let sectors: Vec<String> = self
            .sectors
            .as_deref()?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        (!sectors.is_empty()).then_some(sectors)
    }
}

/// 비파괴 전체 백필 실행.
///
/// POST /api/admin/backfill?sectors=L1,DEFI
pub async fn backfill(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BackfillQuery>,
) -> ApiResult<Json<PipelineStats>> {
    let Some(secret) = &state.admin_secret else {
        return Err(ApiErrorResponse::new(
            "ADMIN_DISABLED",
            "ADMIN_SECRET이 설정되지 않아 관리자 엔드포인트가 비활성화되어 있습니다",
        )
        .into_error(StatusCode::FORBIDDEN));
    };
    if !verify_bearer(&headers, secret) {
        warn!("관리자 요청 인증 실패");
        return Err(ApiErrorResponse::new("UNAUTHORIZED", "유효하지 않은 관리자 시크릿입니다")
            .into_error(StatusCode::UNAUTHORIZED));
    }

    let Some(_guard) = state.try_lock_pipeline() else {
        return Err(
            ApiErrorResponse::new("PIPELINE_BUSY", "다른 파이프라인 작업이 실행 중입니다")
                .into_error(StatusCode::CONFLICT),
        );
    };

    let options = BackfillOptions {
        truncate: false,
        sectors: query.sector_list(),
        end_time_ms: None,
    };

    let stats = run_backfill(
        state.store.clone(),
        state.source.as_ref(),
        &state.index,
        &options,
    )
    .await
    .map_err(|e| {
        error!(error = %e, "관리자 백필 실패");
        ApiErrorResponse::from_pipeline(&e)
    })?;

    stats.log_summary("관리자 백필");
    state.chart_cache.clear().await;

    Ok(Json(stats))
}

/// 관리자 라우터 생성.
pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new().route("/backfill", post(backfill))
}
