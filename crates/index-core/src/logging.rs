//! 로깅 초기화.
//!
//! 바이너리(`index-collector`, `index-api`)는 시작할 때 [`init_logging`]을 한 번 호출합니다.
//! 필터는 `RUST_LOG`가 우선하며, 없으면 파이프라인 크레이트마다 같은 레벨을 적용하는
//! 지시자 목록을 만듭니다.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// 기본 레벨이 적용되는 파이프라인 크레이트.
pub const PIPELINE_TARGETS: &[&str] = &[
    "index_core",
    "index_exchange",
    "index_data",
    "index_collector",
    "index_api",
];

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 여러 줄로 펼친 개발용 형식
    Pretty,
    /// 로그 수집기용 JSON (현재 span 필드 포함)
    Json,
    /// 배치 작업 콘솔용 한 줄 형식
    #[default]
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!("지원하지 않는 로그 형식: {} (pretty|json|compact)", other)),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 파이프라인 크레이트 레벨 (trace, debug, info, warn, error)
    pub level: String,
    /// 추가 필터 지시자 (예: "tower_http=debug")
    pub directives: Vec<String>,
    /// 출력 형식
    pub format: LogFormat,
    /// 소스 파일/줄 번호 출력 (pretty 전용)
    pub with_file: bool,
    /// span 종료 시 소요 시간 출력
    pub with_span_close: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directives: Vec::new(),
            format: LogFormat::default(),
            with_file: false,
            with_span_close: false,
        }
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Self::default()
        }
    }

    /// `LOG_LEVEL`, `LOG_FORMAT` 환경 변수로 구성합니다.
    pub fn from_env() -> Self {
        let mut config = Self::new(std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()));
        if let Some(format) = std::env::var("LOG_FORMAT").ok().and_then(|v| v.parse().ok()) {
            config.format = format;
        }
        config
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// 파이프라인 외 크레이트의 필터 지시자를 추가합니다.
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    pub fn with_span_close(mut self, enabled: bool) -> Self {
        self.with_span_close = enabled;
        self
    }

    /// `RUST_LOG`가 없을 때 사용할 필터 문자열.
    ///
    /// `level`이 이미 지시자 목록(`=` 포함)이면 그대로 사용합니다.
    pub fn filter_directives(&self) -> String {
        let mut parts: Vec<String> = if self.level.contains('=') {
            vec![self.level.clone()]
        } else {
            PIPELINE_TARGETS
                .iter()
                .map(|target| format!("{}={}", target, self.level))
                .collect()
        };
        parts.extend(self.directives.iter().cloned());
        parts.join(",")
    }
}

/// 전역 tracing subscriber를 설치합니다.
///
/// 두 번째 호출은 에러를 반환합니다.
///
/// ```no_run
/// use index_core::logging::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::new("debug").with_format(LogFormat::Json))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.filter_directives())?,
    };

    let span_events = if config.with_span_close {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_file(config.with_file)
            .with_line_number(config.with_file)
            .with_span_events(span_events)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_span_events(span_events)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_span_events(span_events)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()?;

    tracing::debug!(format = ?config.format, filter = %config.filter_directives(), "로깅 초기화 완료");
    Ok(())
}

/// 섹터(및 단계) 필드를 가진 파이프라인 span.
///
/// ```ignore
/// let span = index_core::pipeline_span!("backfill_sector", sector.key);
/// ```
#[macro_export]
macro_rules! pipeline_span {
    ($name:expr, $sector:expr) => {
        tracing::info_span!($name, sector = %$sector)
    };
    ($name:expr, $sector:expr, $stage:expr) => {
        tracing::info_span!($name, sector = %$sector, stage = %$stage)
    };
}
