//! 인덱스 계산기.

use super::aggregate::SectorSeries;
use crate::domain::IndexRecord;

/// 원시값을 리베이스된 인덱스로 변환합니다 (반올림 전).
///
/// `base > 0`이면 `(raw / base) * scale`, 아니면 0.
pub fn index_value(raw: f64, base: f64, scale_constant: f64) -> f64 {
    if base > 0.0 {
        raw / base * scale_constant
    } else {
        0.0
    }
}

/// 소수점 2자리로 반올림합니다.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 섹터 시리즈의 모든 버킷을 인덱스 레코드로 변환합니다.
///
/// `raw_value`는 반올림하지 않고, `index_value`만 2자리로 반올림합니다.
pub fn compute_records(series: &SectorSeries, base: f64, scale_constant: f64) -> Vec<IndexRecord> {
    series
        .iter()
        .map(|(timestamp, raw)| IndexRecord {
            sector_key: series.sector_key.clone(),
            timestamp,
            raw_value: raw,
            index_value: round2(index_value(raw, base, scale_constant)),
            scale_constant,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SeriesKind, Timeframe};

    #[test]
    fn test_index_value() {
        assert_eq!(round2(index_value(40.0, 30.0, 1000.0)), 1333.33);
        assert_eq!(round2(index_value(1250.0, 1000.0, 100.0)), 125.0);
        assert_eq!(index_value(10.0, 0.0, 100.0), 0.0);
        assert_eq!(index_value(10.0, -5.0, 100.0), 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(99.994), 99.99);
        assert_eq!(round2(-2.345_1), -2.35);
    }

    #[test]
    fn test_compute_records_keeps_raw_unrounded() {
        let mut series = SectorSeries::empty("VOL", SeriesKind::Volume, Timeframe::H1);
        series.points.insert(3600, 1234.5678);
        series.contributing_symbols = 1;

        let records = compute_records(&series, 1000.0, 100.0);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sector_key, "VOL");
        assert_eq!(records[0].raw_value, 1234.5678);
        assert_eq!(records[0].index_value, 123.46);
        assert_eq!(records[0].scale_constant, 100.0);
    }
}
