//! 설정 관리.
//!
//! 파이프라인 프로파일(시리즈 종류, 버킷 폭, 스케일 상수), 거래소 엔드포인트,
//! 섹터 바스켓 정의를 로드하고 검증합니다.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::domain::{is_composite_key, SectorDefinition};
use crate::error::{IndexError, IndexResult};
use crate::types::{SeriesKind, Timeframe};

/// 애플리케이션 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    /// 파이프라인 프로파일
    #[serde(default)]
    pub profile: ProfileConfig,
    /// 거래소 설정
    #[serde(default)]
    pub exchange: ExchangeConfig,
    /// 섹터 바스켓 목록
    #[serde(default)]
    pub sectors: Vec<SectorDefinition>,
}

/// 파이프라인 프로파일.
///
/// 한 배포는 하나의 프로파일만 사용합니다. 과거 시드와 증분 실행 사이에
/// 스케일 상수나 버킷 폭을 섞으면 연속성이 깨집니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileConfig {
    /// 시리즈 종류 (price | volume)
    #[serde(default = "default_series")]
    pub series: SeriesKind,
    /// 버킷 타임프레임 (1h | 1d)
    #[serde(default = "default_timeframe")]
    pub timeframe: Timeframe,
    /// 리베이스 스케일 상수 (100 또는 1000)
    #[serde(default = "default_scale_constant")]
    pub scale_constant: f64,
    /// 기준값 윈도우 (버킷 수, 미지정 시 타임프레임 기본값)
    #[serde(default)]
    pub base_window: Option<usize>,
    /// 백필 시작 경계 (YYYY-MM-DD 또는 RFC3339)
    #[serde(default = "default_history_start")]
    pub history_start: String,
    /// 백필 페이지 크기 (요청당 캔들 수)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// 증분 업데이트 시 심볼당 조회할 최근 캔들 수
    #[serde(default = "default_recent_limit")]
    pub recent_limit: u32,
    /// 저장 청크 크기
    #[serde(default = "default_write_chunk_size")]
    pub write_chunk_size: usize,
}

fn default_series() -> SeriesKind {
    SeriesKind::Price
}
fn default_timeframe() -> Timeframe {
    Timeframe::H1
}
fn default_scale_constant() -> f64 {
    1000.0
}
fn default_history_start() -> String {
    "2021-01-01".to_string()
}
fn default_page_size() -> u32 {
    1000
}
fn default_recent_limit() -> u32 {
    2
}
fn default_write_chunk_size() -> usize {
    500
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            series: default_series(),
            timeframe: default_timeframe(),
            scale_constant: default_scale_constant(),
            base_window: None,
            history_start: default_history_start(),
            page_size: default_page_size(),
            recent_limit: default_recent_limit(),
            write_chunk_size: default_write_chunk_size(),
        }
    }
}

impl ProfileConfig {
    /// 실제 적용되는 기준값 윈도우.
    pub fn base_window(&self) -> usize {
        self.base_window
            .unwrap_or_else(|| self.timeframe.default_base_window())
    }

    /// 백필 시작 경계를 Unix 초로 반환합니다.
    pub fn history_start_ts(&self) -> IndexResult<i64> {
        parse_boundary(&self.history_start)
    }
}

/// 거래소 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExchangeConfig {
    /// REST API 기본 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 주 엔드포인트 실패 시 사용할 보조 URL (증분 업데이트 전용)
    #[serde(default)]
    pub fallback_base_url: Option<String>,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.binance.com".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            fallback_base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl IndexConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 환경 변수는 `INDEX__PROFILE__SCALE_CONSTANT=100` 형식으로 오버라이드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> IndexResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("INDEX")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: IndexConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    ///
    /// `INDEX_CONFIG` 환경 변수가 있으면 그 경로를 사용합니다.
    pub fn load_default() -> IndexResult<Self> {
        let path =
            std::env::var("INDEX_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
        Self::load(path)
    }

    /// 설정 값의 일관성을 검증합니다.
    pub fn validate(&self) -> IndexResult<()> {
        if self.sectors.is_empty() {
            return Err(IndexError::Config("섹터가 하나 이상 필요합니다".to_string()));
        }

        let mut seen = HashSet::new();
        for sector in &self.sectors {
            if sector.key.trim().is_empty() {
                return Err(IndexError::Config("빈 섹터 키".to_string()));
            }
            if is_composite_key(&sector.key) {
                return Err(IndexError::Config(format!(
                    "'{}'는 컴포지트 예약 키입니다",
                    sector.key
                )));
            }
            if !seen.insert(sector.key.as_str()) {
                return Err(IndexError::Config(format!("중복 섹터 키: {}", sector.key)));
            }
            if sector.symbols.is_empty() {
                return Err(IndexError::Config(format!(
                    "섹터 {}에 심볼이 없습니다",
                    sector.key
                )));
            }
        }

        let profile = &self.profile;
        if !(profile.scale_constant.is_finite() && profile.scale_constant > 0.0) {
            return Err(IndexError::Config(format!(
                "scale_constant는 양수여야 합니다: {}",
                profile.scale_constant
            )));
        }
        if profile.base_window() == 0 {
            return Err(IndexError::Config("base_window는 0보다 커야 합니다".to_string()));
        }
        if profile.page_size == 0 || profile.recent_limit == 0 {
            return Err(IndexError::Config(
                "page_size와 recent_limit는 0보다 커야 합니다".to_string(),
            ));
        }
        if profile.write_chunk_size == 0 {
            return Err(IndexError::Config(
                "write_chunk_size는 0보다 커야 합니다".to_string(),
            ));
        }
        profile.history_start_ts()?;

        Ok(())
    }

    /// 키로 섹터를 조회합니다.
    pub fn sector(&self, key: &str) -> Option<&SectorDefinition> {
        self.sectors.iter().find(|s| s.key == key)
    }

    /// 지정된 키만 남긴 섹터 목록을 반환합니다 (`None`이면 전체).
    pub fn select_sectors(&self, keys: Option<&[String]>) -> IndexResult<Vec<SectorDefinition>> {
        match keys {
            None => Ok(self.sectors.clone()),
            Some(keys) => keys
                .iter()
                .map(|k| {
                    self.sector(k)
                        .cloned()
                        .ok_or_else(|| IndexError::InvalidInput(format!("알 수 없는 섹터: {}", k)))
                })
                .collect(),
        }
    }
}

/// "YYYY-MM-DD" 또는 RFC3339 문자열을 Unix 초로 파싱합니다.
fn parse_boundary(s: &str) -> IndexResult<i64> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc().timestamp());
        }
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc).timestamp())
        .map_err(|e| IndexError::Config(format!("잘못된 history_start '{}': {}", s, e)))
}
