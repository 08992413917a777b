//! 에러 타입 정의.

use index_core::IndexError;
use index_data::DataError;
use index_exchange::ExchangeError;
use thiserror::Error;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 파이프라인 설정/입력 에러
    #[error(transparent)]
    Index(#[from] IndexError),

    /// 저장소 에러
    #[error("Storage error: {0}")]
    Data(#[from] DataError),

    /// 데이터 소스 에러
    #[error("Data source error: {0}")]
    DataSource(#[from] ExchangeError),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
