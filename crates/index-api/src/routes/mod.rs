//! REST API 라우트.
//!
//! # 엔드포인트
//!
//! - `/health` - 헬스 체크
//! - `/api/cron/update-chart` - 증분 업데이트 (GET, POST)
//! - `/api/admin/backfill` - 비파괴 전체 백필 (요청 타임아웃 제외)
//! - `/api/v1/index/chart` - 인덱스 시리즈 조회

pub mod admin;
pub mod chart;
pub mod cron;
pub mod health;

use axum::{http::StatusCode, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

use crate::state::AppState;

pub use admin::{admin_router, BackfillQuery};
pub use chart::{chart_router, ChartCache, ChartPoint, ChartQuery, ChartResponse};
pub use cron::{cron_router, CronResponse};
pub use health::{health_router, ComponentState, ComponentStatus, HealthResponse, HealthStatus};

/// 요청 타임아웃 안에서 끝나야 하는 라우트.
fn bounded_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/cron", cron_router())
        .nest("/api/v1/index", chart_router())
}

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    bounded_routes().nest("/api/admin", admin_router())
}

/// 요청 타임아웃을 적용한 전체 API 라우터.
///
/// 관리자 백필은 전체 이력을 수집하므로 `timeout` 밖에서 실행됩니다.
/// 레이어는 먼저 등록된 라우트에만 적용되므로 관리자 라우터는 마지막에 붙입니다.
pub fn create_api_router_with_timeout(timeout: Duration) -> Router<Arc<AppState>> {
    bounded_routes()
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .nest("/api/admin", admin_router())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use index_data::IndexStore;
    use secrecy::SecretString;
    use tower::ServiceExt;

    use crate::state::{create_test_state, create_test_state_with, test_kline_source};
    use crate::testing::SlowStore;

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let app = create_api_router().with_state(Arc::new(create_test_state()));
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    #[tokio::test]
    async fn test_routes_are_mounted() {
        assert_eq!(status_of("GET", "/health").await, StatusCode::OK);
        assert_eq!(status_of("GET", "/health/ready").await, StatusCode::OK);
        assert_eq!(status_of("GET", "/api/cron/update-chart").await, StatusCode::OK);
        assert_eq!(status_of("GET", "/api/v1/index/chart").await, StatusCode::OK);
        assert_eq!(
            status_of("POST", "/api/admin/backfill").await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_admin_backfill_rejects_get() {
        assert_eq!(
            status_of("GET", "/api/admin/backfill").await,
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_timeout_skips_admin_backfill() {
        let store = Arc::new(SlowStore::new(Duration::from_secs(5)));
        let mut state = create_test_state_with(store.clone(), Arc::new(test_kline_source()));
        state.admin_secret = Some(SecretString::from("admin-token"));
        let app = create_api_router_with_timeout(Duration::from_secs(1))
            .with_state(Arc::new(state));

        let cron = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/cron/update-chart")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(cron.status(), StatusCode::REQUEST_TIMEOUT);

        let admin = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/admin/backfill")
                    .header("Authorization", "Bearer admin-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(admin.status(), StatusCode::OK);
        // L1, DEFI 각 3행 + ALL 3행
        assert_eq!(store.count().await.unwrap(), 9);
    }
}
