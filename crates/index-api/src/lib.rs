//! 섹터 인덱스 HTTP 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 크론 트리거용 증분 업데이트 엔드포인트
//! - 관리자용 비파괴 백필 엔드포인트
//! - TTL 캐시를 거치는 차트 조회 엔드포인트
//! - 헬스 체크 엔드포인트
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: Bearer 시크릿 검증
//! - [`cache`]: 주입 가능한 시계를 쓰는 TTL 캐시

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
#[cfg(test)]
mod testing;

pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use config::ServerConfig;
pub use error::{ApiErrorResponse, ApiResult};
pub use routes::*;
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
