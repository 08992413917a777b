//! 저장 단위인 인덱스 레코드.

use serde::{Deserialize, Serialize};

use super::sector::is_composite_key;

/// (sector_key, timestamp)당 한 행으로 저장되는 인덱스 레코드.
///
/// `(sector_key, timestamp)`가 자연 키이며 쓰기는 이 키에 대한 upsert입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// 섹터 식별자 또는 컴포지트 키 "ALL"
    pub sector_key: String,
    /// 버킷 시작 시각 (Unix 초)
    pub timestamp: i64,
    /// 집계 원시값 (반올림하지 않음, 컴포지트는 0)
    pub raw_value: f64,
    /// 리베이스된 인덱스 값 (소수점 2자리)
    pub index_value: f64,
    /// 이 값을 계산할 때 사용한 스케일 상수
    pub scale_constant: f64,
}

impl IndexRecord {
    /// 컴포지트 레코드인지 확인합니다.
    pub fn is_composite(&self) -> bool {
        is_composite_key(&self.sector_key)
    }

    /// 자연 키를 반환합니다.
    pub fn key(&self) -> (&str, i64) {
        (&self.sector_key, self.timestamp)
    }

    /// 기준값 복원에 쓸 수 있는 레코드인지 확인합니다.
    ///
    /// 원시값 0인 버킷이나 0.00으로 반올림된 인덱스는 `raw * scale / index`를 풀 수 없습니다.
    pub fn can_recover_base(&self) -> bool {
        self.index_value > 0.0
            && self.raw_value > 0.0
            && self.index_value.is_finite()
            && self.raw_value.is_finite()
    }
}
