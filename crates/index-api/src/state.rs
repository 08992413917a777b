//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Arc로 래핑되어 여러 요청 간에 공유됩니다.

use std::sync::Arc;
use std::time::Duration;

use index_core::IndexConfig;
use index_data::IndexStore;
use index_exchange::KlineSource;
use secrecy::SecretString;
use tokio::sync::{Mutex, MutexGuard};

use crate::cache::TtlCache;
use crate::config::ServerConfig;
use crate::routes::chart::ChartCache;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 인덱스 레코드 저장소
    pub store: Arc<dyn IndexStore>,

    /// 캔들 데이터 소스
    pub source: Arc<dyn KlineSource>,

    /// 파이프라인 설정 (프로파일, 섹터)
    pub index: Arc<IndexConfig>,

    /// 차트 응답 캐시
    pub chart_cache: Arc<ChartCache>,

    /// 크론 엔드포인트 시크릿
    pub cron_secret: Option<SecretString>,

    /// 관리자 엔드포인트 시크릿
    pub admin_secret: Option<SecretString>,

    /// 크론 실행 예산
    pub cron_budget: Duration,

    /// 파이프라인 실행 잠금. 백필과 증분 업데이트는 동시에 하나만 실행됩니다.
    pipeline_lock: Arc<Mutex<()>>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    pub fn new(
        store: Arc<dyn IndexStore>,
        source: Arc<dyn KlineSource>,
        index: IndexConfig,
        server: &ServerConfig,
    ) -> Self {
        Self {
            store,
            source,
            index: Arc::new(index),
            chart_cache: Arc::new(TtlCache::with_system_clock(server.chart_cache_ttl())),
            cron_secret: server.cron_secret.clone(),
            admin_secret: server.admin_secret.clone(),
            cron_budget: server.cron_budget(),
            pipeline_lock: Arc::new(Mutex::new(())),
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 차트 캐시 교체.
    pub fn with_chart_cache(mut self, cache: ChartCache) -> Self {
        self.chart_cache = Arc::new(cache);
        self
    }

    /// 파이프라인 실행 잠금을 시도합니다. 이미 실행 중이면 `None`입니다.
    pub fn try_lock_pipeline(&self) -> Option<MutexGuard<'_, ()>> {
        self.pipeline_lock.try_lock().ok()
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }
}

/// 테스트용 IndexConfig.
///
/// 섹터 `L1 = [AAA, BBB]`, `DEFI = [CCC]`, 시간 버킷, 스케일 1000, 기준 윈도우 2.
#[cfg(any(test, feature = "test-utils"))]
pub fn test_index_config() -> IndexConfig {
    use index_core::{ProfileConfig, SectorDefinition};

    IndexConfig {
        profile: ProfileConfig {
            base_window: Some(2),
            history_start: "1970-01-01".to_string(),
            ..ProfileConfig::default()
        },
        exchange: Default::default(),
        sectors: vec![
            SectorDefinition::new("L1", ["AAA", "BBB"]),
            SectorDefinition::new("DEFI", ["CCC"]),
        ],
    }
}

/// 테스트용 캔들 소스.
///
/// 0, 1, 2시 버킷에 `AAA=[10,20,30]`, `BBB=[30,40,50]`, `CCC=[100,110,120]` 종가를 가집니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn test_kline_source() -> index_exchange::testing::ScriptedKlineSource {
    use index_core::Candle;

    let closes = |values: [f64; 3]| -> Vec<Candle> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Candle::new(i as i64 * 3600, *v, 1.0))
            .collect()
    };

    index_exchange::testing::ScriptedKlineSource::new()
        .with_history("AAA", closes([10.0, 20.0, 30.0]))
        .with_history("BBB", closes([30.0, 40.0, 50.0]))
        .with_history("CCC", closes([100.0, 110.0, 120.0]))
}

/// 테스트용 AppState 생성 (메모리 저장소, 스크립트 캔들 소스).
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    create_test_state_with(
        Arc::new(index_data::MemoryIndexStore::new()),
        Arc::new(test_kline_source()),
    )
}

/// 저장소와 소스를 지정해 테스트용 AppState 생성.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state_with(
    store: Arc<dyn IndexStore>,
    source: Arc<dyn KlineSource>,
) -> AppState {
    AppState::new(store, source, test_index_config(), &ServerConfig::default())
}
