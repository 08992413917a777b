//! 시장 데이터 페처.
//!
//! 심볼 하나의 과거 캔들을 현재에서 경계 시각까지 역방향 페이지네이션으로
//! 모으고, 섹터 단위로는 심볼별 조회를 동시에 실행합니다.
//!
//! 조회 실패는 에러로 올리지 않습니다. 이미 받은 페이지는 유지하고
//! [`StopReason::Failed`]로 종료 사유만 기록합니다.

use std::collections::BTreeMap;

use chrono::Utc;
use futures::future::join_all;
use index_core::{Candle, Timeframe};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::FetchFailure;
use crate::traits::KlineSource;

/// 페이지네이션 종료 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "failure")]
pub enum StopReason {
    /// 가장 이른 캔들이 경계 시각 이하에 도달
    ReachedBoundary,
    /// 소스가 더 이상 과거 데이터를 갖고 있지 않음 (짧은 페이지)
    Exhausted,
    /// 요청 실패 (이미 받은 페이지는 유지)
    Failed(FetchFailure),
}

/// 심볼 하나에 대한 조회 결과.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchOutcome {
    /// 심볼
    pub symbol: String,
    /// 시간순으로 정렬된 캔들 (중복 제거, 경계 이전 제거)
    pub candles: Vec<Candle>,
    /// 종료 사유
    pub stop: StopReason,
    /// 요청한 페이지 수
    pub pages: usize,
}

impl FetchOutcome {
    /// 실패로 끝났는지 확인.
    pub fn is_failed(&self) -> bool {
        matches!(self.stop, StopReason::Failed(_))
    }
}

/// 과거 조회 요청 파라미터.
#[derive(Debug, Clone, Copy)]
pub struct HistoryRequest {
    /// 버킷 타임프레임
    pub timeframe: Timeframe,
    /// 경계 시각 (Unix 초). 이보다 이른 캔들은 버립니다.
    pub boundary: i64,
    /// 요청당 캔들 수
    pub page_size: u32,
    /// 첫 요청의 endTime (밀리초, 없으면 현재 시각)
    pub end_time_ms: Option<i64>,
}

impl HistoryRequest {
    pub fn new(timeframe: Timeframe, boundary: i64, page_size: u32) -> Self {
        Self {
            timeframe,
            boundary,
            page_size,
            end_time_ms: None,
        }
    }

    /// 첫 요청의 endTime을 지정합니다.
    pub fn ending_at(mut self, end_time_ms: i64) -> Self {
        self.end_time_ms = Some(end_time_ms);
        self
    }
}

/// 심볼 하나의 과거 캔들을 경계 시각까지 역방향으로 수집합니다.
pub async fn fetch_history(
    source: &dyn KlineSource,
    symbol: &str,
    request: HistoryRequest,
) -> FetchOutcome {
    let page_size = request.page_size.max(1);
    let mut end_time = request
        .end_time_ms
        .unwrap_or_else(|| Utc::now().timestamp_millis());
    let mut collected: BTreeMap<i64, Candle> = BTreeMap::new();
    let mut pages = 0;

    let stop = loop {
        pages += 1;
        let page = match source
            .fetch_page(symbol, request.timeframe, page_size, Some(end_time))
            .await
        {
            Ok(page) => page,
            Err(e) => {
                warn!(
                    symbol,
                    page = pages,
                    end_time,
                    error = %e,
                    "캔들 페이지 조회 실패, 수집된 데이터까지만 사용"
                );
                break StopReason::Failed(e.failure_kind());
            }
        };

        let received = page.len();
        let Some(earliest) = page.iter().map(|c| c.open_time).min() else {
            break StopReason::Exhausted;
        };

        for candle in page {
            collected.insert(candle.open_time, candle);
        }

        debug!(symbol, page = pages, received, earliest, "캔들 페이지 수신");

        if earliest <= request.boundary {
            break StopReason::ReachedBoundary;
        }
        if received < page_size as usize {
            break StopReason::Exhausted;
        }

        let next_end = earliest * 1000 - 1;
        if next_end >= end_time {
            warn!(symbol, next_end, end_time, "페이지 커서가 뒤로 이동하지 않음, 수집 중단");
            break StopReason::Exhausted;
        }
        end_time = next_end;
    };

    let candles: Vec<Candle> = collected
        .split_off(&request.boundary)
        .into_values()
        .collect();

    debug!(symbol, candles = candles.len(), pages, ?stop, "심볼 수집 완료");

    FetchOutcome {
        symbol: symbol.to_string(),
        candles,
        stop,
        pages,
    }
}

/// 섹터에 속한 심볼들의 과거 캔들을 동시에 수집합니다.
///
/// 결과는 입력 심볼 순서를 따릅니다.
pub async fn fetch_sector_history(
    source: &dyn KlineSource,
    symbols: &[String],
    request: HistoryRequest,
) -> Vec<FetchOutcome> {
    let outcomes = join_all(
        symbols
            .iter()
            .map(|symbol| fetch_history(source, symbol, request)),
    )
    .await;

    log_sector_outcomes(&outcomes);
    outcomes
}

/// 심볼 하나의 최근 캔들 `limit`개를 조회합니다.
pub async fn fetch_recent(
    source: &dyn KlineSource,
    symbol: &str,
    timeframe: Timeframe,
    limit: u32,
) -> FetchOutcome {
    match source.fetch_recent(symbol, timeframe, limit).await {
        Ok(mut candles) => {
            candles.sort_by_key(|c| c.open_time);
            candles.dedup_by_key(|c| c.open_time);
            FetchOutcome {
                symbol: symbol.to_string(),
                candles,
                stop: StopReason::Exhausted,
                pages: 1,
            }
        }
        Err(e) => {
            warn!(symbol, error = %e, "최근 캔들 조회 실패");
            FetchOutcome {
                symbol: symbol.to_string(),
                candles: Vec::new(),
                stop: StopReason::Failed(e.failure_kind()),
                pages: 1,
            }
        }
    }
}

/// 섹터에 속한 심볼들의 최근 캔들을 동시에 조회합니다.
pub async fn fetch_sector_recent(
    source: &dyn KlineSource,
    symbols: &[String],
    timeframe: Timeframe,
    limit: u32,
) -> Vec<FetchOutcome> {
    join_all(
        symbols
            .iter()
            .map(|symbol| fetch_recent(source, symbol, timeframe, limit)),
    )
    .await
}

fn log_sector_outcomes(outcomes: &[FetchOutcome]) {
    let failed = outcomes.iter().filter(|o| o.is_failed()).count();
    let candles: usize = outcomes.iter().map(|o| o.candles.len()).sum();
    info!(
        symbols = outcomes.len(),
        failed,
        candles,
        "섹터 심볼 수집 완료"
    );
}
