//! 섹터 집계기.
//!
//! 한 섹터에 속한 심볼들의 캔들을 버킷 격자에 맞춰 하나의 시리즈로 병합합니다.
//! 같은 버킷에 들어온 값은 거래량 모드에서는 합산, 가격 모드에서는
//! 기여한 심볼 수로 평균됩니다.

use std::collections::BTreeMap;

use crate::domain::Candle;
use crate::types::{SeriesKind, Timeframe};

/// 한 섹터의 버킷별 집계 시리즈.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorSeries {
    /// 섹터 식별자
    pub sector_key: String,
    /// 시리즈 종류
    pub kind: SeriesKind,
    /// 버킷 타임프레임
    pub timeframe: Timeframe,
    /// 버킷 시작 시각 → 집계값 (시간순)
    pub points: BTreeMap<i64, f64>,
    /// 데이터를 가진 심볼 수
    pub contributing_symbols: usize,
}

impl SectorSeries {
    /// 빈 시리즈를 생성합니다.
    pub fn empty(sector_key: impl Into<String>, kind: SeriesKind, timeframe: Timeframe) -> Self {
        Self {
            sector_key: sector_key.into(),
            kind,
            timeframe,
            points: BTreeMap::new(),
            contributing_symbols: 0,
        }
    }

    /// 하나 이상의 심볼이 데이터를 제공했는지 여부.
    pub fn has_data(&self) -> bool {
        self.contributing_symbols > 0 && !self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 가장 이른 버킷의 값.
    pub fn first_value(&self) -> Option<f64> {
        self.points.values().next().copied()
    }

    /// 특정 버킷의 값.
    pub fn get(&self, bucket: i64) -> Option<f64> {
        self.points.get(&bucket).copied()
    }

    /// (버킷, 값)을 시간순으로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.points.iter().map(|(ts, v)| (*ts, *v))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    sum: f64,
    count: u32,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// 심볼별 캔들 시퀀스를 섹터 시리즈로 집계합니다.
///
/// 각 심볼의 캔들은 먼저 심볼 단위로 버킷에 모입니다 (가격은 평균, 거래량은 합).
/// 그 다음 심볼 간에 거래량은 합산하고, 가격은 해당 버킷에 기여한 심볼 수로 나눕니다.
/// 캔들이 하나도 없는 심볼은 아무것도 기여하지 않습니다. 유한하지 않은 값은 버립니다.
pub fn aggregate_sector(
    sector_key: &str,
    kind: SeriesKind,
    timeframe: Timeframe,
    per_symbol: &[Vec<Candle>],
) -> SectorSeries {
    let mut buckets: BTreeMap<i64, Accumulator> = BTreeMap::new();
    let mut contributing_symbols = 0;

    for candles in per_symbol {
        let mut own: BTreeMap<i64, Accumulator> = BTreeMap::new();
        for candle in candles {
            let value = kind.value_of(candle);
            if !value.is_finite() {
                continue;
            }
            own.entry(timeframe.bucket(candle.open_time))
                .or_default()
                .push(value);
        }

        if own.is_empty() {
            continue;
        }
        contributing_symbols += 1;

        for (bucket, acc) in own {
            let symbol_value = if kind.is_averaged() { acc.mean() } else { acc.sum };
            buckets.entry(bucket).or_default().push(symbol_value);
        }
    }

    let points = buckets
        .into_iter()
        .map(|(bucket, acc)| {
            let value = if kind.is_averaged() { acc.mean() } else { acc.sum };
            (bucket, value)
        })
        .collect();

    SectorSeries {
        sector_key: sector_key.to_string(),
        kind,
        timeframe,
        points,
        contributing_symbols,
    }
}
