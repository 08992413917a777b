//! 컴포지트("ALL") 인덱스 빌더.

use std::collections::BTreeMap;

use super::calculate::round2;
use crate::domain::{IndexRecord, COMPOSITE_KEY};

/// 같은 타임스탬프의 섹터 인덱스 값을 평균하여 컴포지트 레코드를 만듭니다.
///
/// - 입력에 포함된 기존 컴포지트 레코드는 무시합니다.
/// - 해당 타임스탬프에 데이터가 없는 섹터는 평균에서 빠집니다 (0으로 채우지 않음).
/// - 섹터 하나만 보고된 타임스탬프도 컴포지트 행을 만듭니다.
/// - `raw_value`는 0, 스케일 상수는 그 타임스탬프의 첫 섹터 레코드 값을 따릅니다.
pub fn build_composite(records: &[IndexRecord]) -> Vec<IndexRecord> {
    let mut groups: BTreeMap<i64, (f64, usize, f64)> = BTreeMap::new();

    for record in records.iter().filter(|r| !r.is_composite()) {
        let entry = groups
            .entry(record.timestamp)
            .or_insert((0.0, 0, record.scale_constant));
        entry.0 += record.index_value;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(timestamp, (sum, count, scale_constant))| IndexRecord {
            sector_key: COMPOSITE_KEY.to_string(),
            timestamp,
            raw_value: 0.0,
            index_value: round2(sum / count as f64),
            scale_constant,
        })
        .collect()
}
