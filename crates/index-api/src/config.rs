//! 서버 설정.

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;

/// 서버 설정 구조체.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 바인딩할 호스트 주소
    pub host: String,
    /// 바인딩할 포트
    pub port: u16,
    /// 데이터베이스 URL
    pub database_url: Option<SecretString>,
    /// 크론 엔드포인트 Bearer 시크릿 (없으면 인증 없음)
    pub cron_secret: Option<SecretString>,
    /// 관리자 엔드포인트 Bearer 시크릿 (없으면 엔드포인트 비활성)
    pub admin_secret: Option<SecretString>,
    /// 크론 실행 예산 (초)
    pub cron_budget_secs: u64,
    /// 차트 캐시 TTL (초)
    pub chart_cache_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_url: None,
            cron_secret: None,
            admin_secret: None,
            cron_budget_secs: 60,
            chart_cache_ttl_secs: 60,
        }
    }
}

impl ServerConfig {
    /// 환경 변수에서 설정 로드.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_var_parse("API_PORT", defaults.port),
            database_url: secret_var("DATABASE_URL"),
            cron_secret: secret_var("CRON_SECRET"),
            admin_secret: secret_var("ADMIN_SECRET"),
            cron_budget_secs: env_var_parse("CRON_BUDGET_SECS", defaults.cron_budget_secs),
            chart_cache_ttl_secs: env_var_parse(
                "CHART_CACHE_TTL_SECS",
                defaults.chart_cache_ttl_secs,
            ),
        }
    }

    /// 소켓 주소 반환.
    ///
    /// # Errors
    /// `host:port` 형식이 유효하지 않으면 `AddrParseError`를 반환합니다.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn cron_budget(&self) -> Duration {
        Duration::from_secs(self.cron_budget_secs)
    }

    pub fn chart_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.chart_cache_ttl_secs)
    }

    /// HTTP 요청 타임아웃. 크론 예산보다 길어야 진행 중인 실행이 잘리지 않습니다.
    ///
    /// 예산이 0(무제한)이면 10분.
    pub fn request_timeout(&self) -> Duration {
        if self.cron_budget_secs == 0 {
            return Duration::from_secs(600);
        }
        self.cron_budget() + Duration::from_secs(30)
    }
}

fn secret_var(key: &str) -> Option<SecretString> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
