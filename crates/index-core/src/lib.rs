//! # Index Core
//!
//! 섹터 인덱스 파이프라인의 핵심 도메인 모델과 계산 로직을 제공합니다.
//!
//! 이 크레이트는 파이프라인 전반에서 사용되는 기본 타입을 제공합니다:
//! - 캔들 및 인덱스 레코드 타입
//! - 섹터(심볼 바스켓) 정의
//! - 타임프레임(버킷 폭) 정의
//! - 집계/정규화/인덱스 계산/컴포지트 엔진
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use engine::*;
pub use error::*;
pub use logging::*;
pub use types::*;
