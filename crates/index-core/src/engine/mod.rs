//! 인덱스 계산 엔진.
//!
//! 파이프라인의 순수 계산 단계를 제공합니다:
//! - [`aggregate`]: 심볼별 캔들 → 섹터 시리즈 (버킷 합/평균)
//! - [`normalize`]: 기준값 산출 및 저장된 레코드로부터의 기준값 복원
//! - [`calculate`]: 원시값 → 리베이스 인덱스
//! - [`composite`]: 섹터 인덱스 → "ALL" 컴포지트
//!
//! I/O는 하지 않습니다. 데이터 조회와 저장은 `index-exchange`, `index-data`가 담당합니다.

pub mod aggregate;
pub mod calculate;
pub mod composite;
pub mod normalize;

pub use aggregate::{aggregate_sector, SectorSeries};
pub use calculate::{compute_records, index_value, round2};
pub use composite::build_composite;
pub use normalize::{base_value, recover_base, BaseSource, RecoveredBase};
