//! 캔들 소스 trait 정의.

use async_trait::async_trait;
use index_core::{Candle, Timeframe};

use crate::ExchangeError;

/// 거래소 작업을 위한 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// 과거/최근 캔들을 제공하는 데이터 소스.
///
/// 반환되는 캔들의 `open_time`은 Unix 초입니다. 페이지 내부 순서는 보장하지 않습니다.
#[async_trait]
pub trait KlineSource: Send + Sync {
    /// 소스 이름 반환.
    fn name(&self) -> &str;

    /// `end_time_ms`(포함) 이전의 캔들을 최대 `limit`개 조회.
    ///
    /// `end_time_ms`가 `None`이면 현재 시각 기준입니다.
    async fn fetch_page(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: u32,
        end_time_ms: Option<i64>,
    ) -> ExchangeResult<Vec<Candle>>;

    /// 최근 캔들 `limit`개 조회 (증분 업데이트용).
    ///
    /// 기본 구현은 `fetch_page(.., None)`이며, 보조 엔드포인트를 가진 소스는 재정의합니다.
    async fn fetch_recent(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: u32,
    ) -> ExchangeResult<Vec<Candle>> {
        self.fetch_page(symbol, timeframe, limit, None).await
    }
}
