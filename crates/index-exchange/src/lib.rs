//! 거래소 캔들 조회.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - KlineSource trait: 캔들 데이터 소스 인터페이스
//! - Binance 캔들 커넥터 (보조 엔드포인트 폴백 포함)
//! - 역방향 페이지네이션 페처와 섹터 단위 동시 조회

pub mod connector;
pub mod error;
pub mod fetcher;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod traits;

pub use connector::BinanceKlineClient;
pub use error::*;
pub use fetcher::{
    fetch_history, fetch_recent, fetch_sector_history, fetch_sector_recent, FetchOutcome,
    HistoryRequest, StopReason,
};
pub use traits::*;
