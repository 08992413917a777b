//! 테스트용 스크립트 캔들 소스.
//!
//! 심볼별 캔들 이력을 메모리에 두고 Binance `klines`와 같은 방식
//! (`endTime` 이하의 마지막 `limit`개)으로 응답합니다.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use index_core::{Candle, Timeframe};

use crate::traits::{ExchangeResult, KlineSource};
use crate::ExchangeError;

type ErrorFactory = Arc<dyn Fn() -> ExchangeError + Send + Sync>;

#[derive(Clone)]
struct FailurePlan {
    successes: usize,
    make_error: ErrorFactory,
}

#[derive(Default)]
struct ScriptState {
    histories: HashMap<String, Vec<Candle>>,
    failures: HashMap<String, FailurePlan>,
    requests: HashMap<String, usize>,
}

/// 스크립트 기반 캔들 소스.
#[derive(Default)]
pub struct ScriptedKlineSource {
    state: Mutex<ScriptState>,
}

impl ScriptedKlineSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 심볼 이력을 설정합니다.
    pub fn with_history(self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.set_history(symbol, candles);
        self
    }

    /// `successes`번 성공한 뒤부터 에러를 반환하도록 설정합니다.
    pub fn fail_after<F>(self, symbol: &str, successes: usize, make_error: F) -> Self
    where
        F: Fn() -> ExchangeError + Send + Sync + 'static,
    {
        self.state().failures.insert(
            symbol.to_string(),
            FailurePlan {
                successes,
                make_error: Arc::new(make_error),
            },
        );
        self
    }

    /// 심볼 이력을 교체합니다 (실행 사이에 데이터를 바꿀 때).
    pub fn set_history(&self, symbol: &str, mut candles: Vec<Candle>) {
        candles.sort_by_key(|c| c.open_time);
        self.state().histories.insert(symbol.to_string(), candles);
    }

    /// 심볼에 대한 요청 횟수.
    pub fn requests(&self, symbol: &str) -> usize {
        self.state().requests.get(symbol).copied().unwrap_or(0)
    }

    fn respond(
        &self,
        symbol: &str,
        limit: u32,
        end_time_ms: Option<i64>,
    ) -> ExchangeResult<Vec<Candle>> {
        let mut state = self.state();
        let made = {
            let counter = state.requests.entry(symbol.to_string()).or_insert(0);
            *counter += 1;
            *counter
        };

        if let Some(plan) = state.failures.get(symbol) {
            if made > plan.successes {
                return Err((plan.make_error)());
            }
        }

        let history = state
            .histories
            .get(symbol)
            .ok_or_else(|| ExchangeError::SymbolNotFound(symbol.to_string()))?;

        let eligible: Vec<Candle> = history
            .iter()
            .filter(|c| end_time_ms.map_or(true, |end| c.open_time * 1000 <= end))
            .copied()
            .collect();
        let skip = eligible.len().saturating_sub(limit as usize);

        Ok(eligible.into_iter().skip(skip).collect())
    }
}

#[async_trait]
impl KlineSource for ScriptedKlineSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_page(
        &self,
        symbol: &str,
        _timeframe: Timeframe,
        limit: u32,
        end_time_ms: Option<i64>,
    ) -> ExchangeResult<Vec<Candle>> {
        self.respond(symbol, limit, end_time_ms)
    }
}
