//! Sector index API 서버.
//!
//! 크론/관리자/차트 엔드포인트를 제공합니다.

use std::sync::Arc;

use axum::Router;
use index_api::{create_api_router_with_timeout, AppState, ServerConfig};
use index_core::{IndexConfig, LogConfig};
use index_data::{Database, DatabaseConfig, IndexStore, PgIndexStore};
use index_exchange::{BinanceKlineClient, KlineSource};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// CORS 레이어 생성.
///
/// `CORS_ORIGINS`(쉼표 구분)가 설정되어 있으면 해당 origin만 허용하고,
/// 없으면 모든 origin을 허용합니다.
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
}

fn create_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    create_api_router_with_timeout(config.request_timeout())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    index_core::init_logging(LogConfig::from_env().with_directive("tower_http=debug"))?;

    info!("Starting Sector Index API server...");

    let config = ServerConfig::from_env();
    let addr = config.socket_addr().map_err(|e| {
        error!(
            host = %config.host,
            port = config.port,
            error = %e,
            "소켓 주소 설정이 유효하지 않습니다. API_HOST, API_PORT 환경변수를 확인하세요."
        );
        e
    })?;

    let index = IndexConfig::load_default()?;

    let Some(database_url) = config.database_url.clone() else {
        error!("DATABASE_URL 환경변수가 설정되지 않았습니다");
        return Err("DATABASE_URL is required".into());
    };
    let db = Database::connect(&DatabaseConfig::new(database_url)).await?;
    db.migrate().await?;
    info!("데이터베이스 연결 성공");

    let store: Arc<dyn IndexStore> = Arc::new(PgIndexStore::from_database(&db));
    let source: Arc<dyn KlineSource> = Arc::new(BinanceKlineClient::new(&index.exchange)?);

    if config.cron_secret.is_none() {
        warn!("CRON_SECRET not set, cron endpoint is unauthenticated");
    }
    if config.admin_secret.is_none() {
        info!("ADMIN_SECRET not set, admin endpoints disabled");
    }

    let state = Arc::new(AppState::new(store, source, index, &config));
    info!(
        version = %state.version,
        sectors = state.index.sectors.len(),
        cron_budget_secs = config.cron_budget_secs,
        "Application state initialized"
    );

    let app = create_router(state, &config);

    info!(%addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown, closing database pool...");
    db.pool().close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
