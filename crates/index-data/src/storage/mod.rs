//! 인덱스 레코드 저장소.
//!
//! - [`postgres`]: `sector_index` 테이블 (운영)
//! - [`memory`]: 프로세스 내 저장소 (드라이런, 테스트)

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use index_core::IndexRecord;

use crate::error::Result;

/// 인덱스 레코드 저장소 인터페이스.
///
/// 자연 키는 `(sector_key, timestamp)`입니다.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// 저장소 이름.
    fn name(&self) -> &str;

    /// 키 기준 upsert. 충돌 시 `raw_value`, `index_value`, `scale_constant`를 덮어씁니다.
    ///
    /// 고유 제약 조건이 없으면 [`DataError::MissingConstraint`](crate::DataError::MissingConstraint)를 반환합니다.
    async fn upsert_chunk(&self, records: &[IndexRecord]) -> Result<usize>;

    /// 충돌 처리 없는 일반 insert.
    async fn insert_chunk(&self, records: &[IndexRecord]) -> Result<usize>;

    /// 기준값을 복원할 수 있는 섹터의 가장 이른 레코드.
    ///
    /// `index_value > 0`이고 `raw_value > 0`인 행만 대상입니다
    /// ([`IndexRecord::can_recover_base`](index_core::IndexRecord::can_recover_base)).
    async fn earliest_valid_record(&self, sector_key: &str) -> Result<Option<IndexRecord>>;

    /// `[from, to]` 구간의 섹터 레코드 (시간 오름차순).
    async fn series_between(&self, sector_key: &str, from: i64, to: i64)
        -> Result<Vec<IndexRecord>>;

    /// 섹터의 최신 `limit`개 레코드 (시간 오름차순).
    async fn latest_series(&self, sector_key: &str, limit: usize) -> Result<Vec<IndexRecord>>;

    /// 모든 레코드 삭제. 삭제된 행 수를 반환합니다.
    async fn truncate(&self) -> Result<u64>;

    /// 저장된 레코드 수.
    async fn count(&self) -> Result<u64>;

    /// 저장소 상태 확인.
    async fn health_check(&self) -> Result<()>;
}
