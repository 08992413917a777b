//! 헬스 체크 endpoint.
//!
//! - `GET /health`: 프로세스 생존 여부 (의존성 확인 없음)
//! - `GET /health/ready`: 저장소 연결과 행 수를 확인

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// 서비스 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// 의존성 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentState {
    Up,
    Down,
}

/// 의존성 하나의 점검 결과.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub state: ComponentState,
    /// 구현 이름 (postgres, memory, binance 등)
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// readiness 응답.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_secs: i64,
    /// 응답 시각 (RFC3339)
    pub timestamp: String,
    /// 설정된 섹터 수 (컴포지트 제외)
    pub sectors: usize,
    pub store: ComponentStatus,
    pub source: ComponentStatus,
}

/// GET /health
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// GET /health/ready
///
/// 저장소 점검이 실패하면 503을 반환합니다. 캔들 소스는 요청 없이 이름만 보고합니다.
pub async fn health_ready(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let store_name = state.store.name().to_string();
    let probe = match state.store.health_check().await {
        Ok(()) => state.store.count().await,
        Err(e) => Err(e),
    };

    let (status, store) = match probe {
        Ok(rows) => (
            HealthStatus::Healthy,
            ComponentStatus {
                state: ComponentState::Up,
                name: store_name,
                detail: Some(format!("{} rows", rows)),
            },
        ),
        Err(e) => {
            tracing::warn!(store = %store_name, error = %e, "저장소 헬스 체크 실패");
            (
                HealthStatus::Unhealthy,
                ComponentStatus {
                    state: ComponentState::Down,
                    name: store_name,
                    detail: Some(e.to_string()),
                },
            )
        }
    };

    let code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status,
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        sectors: state.index.sectors.len(),
        store,
        source: ComponentStatus {
            state: ComponentState::Up,
            name: state.source.name().to_string(),
            detail: None,
        },
    };

    (code, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
