//! 거래소 캔들 데이터.

use serde::{Deserialize, Serialize};

/// 거래소가 보고한 단일 구간 캔들.
///
/// 집계 한 번 동안만 메모리에 유지되며 원본 그대로 저장되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// 구간 시작 시각 (Unix 초)
    pub open_time: i64,
    /// 종가
    pub close: f64,
    /// 거래량 (기준 자산 단위)
    pub volume: f64,
}

impl Candle {
    /// 새 캔들을 생성합니다.
    pub fn new(open_time: i64, close: f64, volume: f64) -> Self {
        Self {
            open_time,
            close,
            volume,
        }
    }
}
