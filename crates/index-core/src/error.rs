//! 인덱스 파이프라인의 에러 타입.
//!
//! 이 모듈은 파이프라인 전반에서 공통으로 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

/// 핵심 파이프라인 에러.
#[derive(Debug, Error)]
pub enum IndexError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),
}

/// 파이프라인 작업을 위한 Result 타입.
pub type IndexResult<T> = Result<T, IndexError>;

impl From<config::ConfigError> for IndexError {
    fn from(err: config::ConfigError) -> Self {
        IndexError::Config(err.to_string())
    }
}
