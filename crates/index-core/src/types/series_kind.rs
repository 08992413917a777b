//! 인덱스 시리즈 종류 (가격/거래량).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::Candle;

/// 파이프라인이 집계하는 시리즈 종류.
///
/// - `Price`: 종가를 버킷별 평균 (바스켓 단면 평균 가격)
/// - `Volume`: 거래량을 버킷별 합산
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    /// 종가 평균
    Price,
    /// 거래량 합계
    Volume,
}

impl SeriesKind {
    /// 캔들에서 이 시리즈가 사용하는 값을 꺼냅니다.
    pub fn value_of(&self, candle: &Candle) -> f64 {
        match self {
            SeriesKind::Price => candle.close,
            SeriesKind::Volume => candle.volume,
        }
    }

    /// 버킷 값이 심볼 수로 평균되는지 여부.
    pub fn is_averaged(&self) -> bool {
        matches!(self, SeriesKind::Price)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Price => "price",
            SeriesKind::Volume => "volume",
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeriesKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "price" => Ok(SeriesKind::Price),
            "volume" => Ok(SeriesKind::Volume),
            _ => Err(format!("Unknown series kind: {}", s)),
        }
    }
}
