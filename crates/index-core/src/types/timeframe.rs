//! 집계 버킷을 위한 타임프레임 정의.
//!
//! 캔들 타임스탬프는 타임프레임 폭의 격자로 내림되어 하나의 버킷에 병합됩니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 캔들/버킷 타임프레임.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// 1시간봉
    #[serde(rename = "1h")]
    H1,
    /// 일봉
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    /// 버킷 폭(초)을 반환합니다.
    pub fn as_secs(&self) -> i64 {
        match self {
            Timeframe::H1 => 3600,
            Timeframe::D1 => 86400,
        }
    }

    /// 기준값 산출에 사용할 기본 윈도우(버킷 수).
    ///
    /// 시간봉은 168개(1주), 일봉은 7개(1주)입니다.
    pub fn default_base_window(&self) -> usize {
        match self {
            Timeframe::H1 => 168,
            Timeframe::D1 => 7,
        }
    }

    /// 바이낸스 간격 문자열로 변환합니다.
    pub fn to_binance_interval(&self) -> &'static str {
        match self {
            Timeframe::H1 => "1h",
            Timeframe::D1 => "1d",
        }
    }

    /// 바이낸스 간격 문자열에서 파싱합니다.
    pub fn from_binance_interval(s: &str) -> Option<Self> {
        match s {
            "1h" => Some(Timeframe::H1),
            "1d" => Some(Timeframe::D1),
            _ => None,
        }
    }

    /// 타임스탬프(초)를 이 타임프레임의 버킷 시작 시각으로 내림합니다.
    ///
    /// `floor(ts / width) * width`. 음수 타임스탬프도 아래쪽으로 내림됩니다.
    pub fn bucket(&self, timestamp: i64) -> i64 {
        let width = self.as_secs();
        timestamp.div_euclid(width) * width
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_binance_interval())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_binance_interval(s).ok_or_else(|| format!("Invalid timeframe: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_timeframe_duration() {
        assert_eq!(Timeframe::H1.as_secs(), 3600);
        assert_eq!(Timeframe::D1.as_secs(), 86400);
    }

    #[test]
    fn test_timeframe_binance() {
        assert_eq!(Timeframe::H1.to_binance_interval(), "1h");
        assert_eq!(Timeframe::from_binance_interval("1d"), Some(Timeframe::D1));
        assert_eq!("4h".parse::<Timeframe>(), Err("Invalid timeframe: 4h".to_string()));
    }

    #[test]
    fn test_bucket_rounds_down() {
        assert_eq!(Timeframe::H1.bucket(0), 0);
        assert_eq!(Timeframe::H1.bucket(3599), 0);
        assert_eq!(Timeframe::H1.bucket(3600), 3600);
        assert_eq!(Timeframe::D1.bucket(86400 + 12345), 86400);
        assert_eq!(Timeframe::H1.bucket(-1), -3600);
    }

    proptest! {
        #[test]
        fn prop_same_window_same_bucket(a in -10_000_000i64..10_000_000, b in -10_000_000i64..10_000_000) {
            for tf in [Timeframe::H1, Timeframe::D1] {
                let w = tf.as_secs();
                if a.div_euclid(w) == b.div_euclid(w) {
                    prop_assert_eq!(tf.bucket(a), tf.bucket(b));
                }
            }
        }

        #[test]
        fn prop_bucket_is_on_grid_and_not_after(ts in -10_000_000i64..10_000_000) {
            let bucket = Timeframe::H1.bucket(ts);
            prop_assert_eq!(bucket % 3600, 0);
            prop_assert!(bucket <= ts);
            prop_assert!(ts - bucket < 3600);
        }
    }
}
