//! 섹터(심볼 바스켓) 정의.

use serde::{Deserialize, Serialize};

/// 컴포지트 인덱스에 예약된 섹터 키.
pub const COMPOSITE_KEY: &str = "ALL";

/// 하나의 경제 카테고리로 취급되는 티커 심볼 바스켓.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorDefinition {
    /// 섹터 식별자 (예: "L1", "DEFI")
    pub key: String,
    /// 표시 이름
    #[serde(default)]
    pub name: Option<String>,
    /// 거래소 티커 심볼 (예: "BTCUSDT")
    pub symbols: Vec<String>,
}

impl SectorDefinition {
    /// 새 섹터 정의를 생성합니다.
    pub fn new<S: Into<String>>(key: impl Into<String>, symbols: impl IntoIterator<Item = S>) -> Self {
        Self {
            key: key.into(),
            name: None,
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    /// 표시 이름 (없으면 키).
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }
}

/// 섹터 키가 컴포지트 예약 키인지 확인합니다.
pub fn is_composite_key(key: &str) -> bool {
    key == COMPOSITE_KEY
}
