//! 환경변수 기반 설정 모듈.

use std::time::Duration;

use index_core::IndexConfig;
use secrecy::SecretString;

use crate::error::CollectorError;
use crate::Result;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL (드라이런에서는 없어도 됨)
    pub database_url: Option<SecretString>,
    /// 파이프라인 설정 (프로파일, 거래소, 섹터)
    pub index: IndexConfig,
    /// 증분 업데이트 설정
    pub incremental: IncrementalConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// 증분 업데이트 설정
#[derive(Debug, Clone)]
pub struct IncrementalConfig {
    /// 실행 예산 (초, 0이면 무제한)
    pub budget_secs: u64,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 증분 업데이트 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let index = IndexConfig::load_default()?;
        Ok(Self::from_index(index))
    }

    /// 파이프라인 설정과 환경변수로 구성
    pub fn from_index(index: IndexConfig) -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(SecretString::from),
            index,
            incremental: IncrementalConfig {
                budget_secs: env_var_parse("INCREMENTAL_BUDGET_SECS", 0),
            },
            daemon: DaemonConfig {
                interval_minutes: env_var_parse("DAEMON_INTERVAL_MINUTES", 60),
            },
        }
    }

    /// 데이터베이스 URL을 요구합니다.
    pub fn require_database_url(&self) -> Result<&SecretString> {
        self.database_url.as_ref().ok_or_else(|| {
            CollectorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })
    }
}

impl IncrementalConfig {
    /// 실행 예산을 Duration으로 반환 (0이면 None)
    pub fn budget(&self) -> Option<Duration> {
        (self.budget_secs > 0).then(|| Duration::from_secs(self.budget_secs))
    }
}

impl DaemonConfig {
    /// 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.max(1) * 60)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_zero_is_unbounded() {
        assert_eq!(IncrementalConfig { budget_secs: 0 }.budget(), None);
        assert_eq!(
            IncrementalConfig { budget_secs: 60 }.budget(),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_daemon_interval_never_zero() {
        assert_eq!(
            DaemonConfig { interval_minutes: 0 }.interval(),
            Duration::from_secs(60)
        );
        assert_eq!(
            DaemonConfig { interval_minutes: 15 }.interval(),
            Duration::from_secs(900)
        );
    }
}
