//! Sector index pipeline runner.
//!
//! 이 crate는 API 서버와 독립적으로 인덱스를 생성/갱신하는 바이너리와
//! 서버가 재사용하는 실행 함수를 제공합니다:
//! - 전체 백필 (history_start부터 기준값 산출)
//! - 증분 업데이트 (저장된 기준값 복원)
//! - 데몬 모드 (주기적 증분 업데이트)

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::{PipelineStats, SectorFailure};
