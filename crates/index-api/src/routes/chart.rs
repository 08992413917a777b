//! 인덱스 차트 조회 endpoint.
//!
//! 저장된 섹터/컴포지트 시리즈를 반환합니다. 결과는 [`ChartCache`]에 TTL 동안
//! 보관되며, 크론 업데이트나 백필이 끝나면 비워집니다.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use index_core::{is_composite_key, IndexRecord, COMPOSITE_KEY};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::TtlCache;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 기본 조회 개수 (시간 버킷 기준 7일)
pub const DEFAULT_CHART_LIMIT: usize = 168;

/// 최대 조회 개수
pub const MAX_CHART_LIMIT: usize = 5000;

/// 캐시 키: (섹터, 조회 개수)
pub type ChartKey = (String, usize);

/// 차트 응답 캐시
pub type ChartCache = TtlCache<ChartKey, ChartResponse>;

/// 차트 조회 파라미터.
#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    /// 섹터 키 (기본값 "ALL")
    pub sector: Option<String>,
    /// 최신 N개 (기본값 168)
    pub limit: Option<usize>,
}

/// 차트 포인트.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// 버킷 시작 시각 (Unix 초)
    pub timestamp: i64,
    /// 인덱스 값
    pub value: f64,
}

/// 차트 응답.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResponse {
    pub sector: String,
    pub points: Vec<ChartPoint>,
}

impl ChartResponse {
    fn from_records(sector: String, records: &[IndexRecord]) -> Self {
        Self {
            sector,
            points: records
                .iter()
                .map(|r| ChartPoint {
                    timestamp: r.timestamp,
                    value: r.index_value,
                })
                .collect(),
        }
    }
}

/// 인덱스 시리즈 조회.
///
/// GET /api/v1/index/chart?sector=ALL&limit=168
pub async fn get_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
) -> ApiResult<Json<ChartResponse>> {
    let sector = query
        .sector
        .unwrap_or_else(|| COMPOSITE_KEY.to_string());
    if !is_composite_key(&sector) && state.index.sector(&sector).is_none() {
        return Err(
            ApiErrorResponse::new("SECTOR_NOT_FOUND", format!("알 수 없는 섹터: {}", sector))
                .into_error(StatusCode::NOT_FOUND),
        );
    }
    let limit = query
        .limit
        .unwrap_or(DEFAULT_CHART_LIMIT)
        .clamp(1, MAX_CHART_LIMIT);

    let key = (sector, limit);
    if let Some(cached) = state.chart_cache.get(&key).await {
        debug!(sector = %key.0, limit, "차트 캐시 적중");
        return Ok(Json(cached));
    }

    let generation = state.chart_cache.generation().await;
    let records = state
        .store
        .latest_series(&key.0, limit)
        .await
        .map_err(|e| {
            tracing::error!(sector = %key.0, error = %e, "차트 조회 실패");
            ApiErrorResponse::new("STORE_ERROR", e.to_string())
                .into_error(StatusCode::INTERNAL_SERVER_ERROR)
        })?;

    let response = ChartResponse::from_records(key.0.clone(), &records);
    if !state.chart_cache.insert(key, response.clone(), generation).await {
        debug!(sector = %response.sector, "조회 중 캐시가 비워져 응답을 캐시하지 않음");
    }

    Ok(Json(response))
}

/// 인덱스 라우터 생성.
pub fn chart_router() -> Router<Arc<AppState>> {
    Router::new().route("/chart", get(get_chart))
}
