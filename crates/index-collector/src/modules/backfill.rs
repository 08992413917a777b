//! 전체 백필 모듈.
//!
//! 섹터별로 `history_start`까지의 전체 이력을 수집하여 기준값을 새로 산출합니다.
//! 섹터 레코드는 섹터가 끝날 때마다 저장하고, 컴포지트는 마지막에 저장합니다.
//!
//! 일부 섹터만 백필하면 나머지 섹터의 저장된 행과 합쳐 해당 시점의 컴포지트를
//! 다시 계산합니다.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use index_core::{
    aggregate_sector, base_value, build_composite, compute_records, Candle, IndexConfig,
    IndexRecord, SectorDefinition, COMPOSITE_KEY,
};
use index_data::{IndexStore, PersistenceWriter};
use index_exchange::{fetch_sector_history, HistoryRequest, KlineSource};
use tracing::{info, warn, Instrument};

use crate::{PipelineStats, Result};

/// 백필 옵션
#[derive(Debug, Clone, Default)]
pub struct BackfillOptions {
    /// 기록 전에 모든 행 삭제 (파괴적)
    pub truncate: bool,
    /// 대상 섹터 (None이면 전체)
    pub sectors: Option<Vec<String>>,
    /// 첫 페이지의 endTime (밀리초, 없으면 현재 시각)
    pub end_time_ms: Option<i64>,
}

/// 전체 백필 실행
pub async fn run_backfill(
    store: Arc<dyn IndexStore>,
    source: &dyn KlineSource,
    config: &IndexConfig,
    options: &BackfillOptions,
) -> Result<PipelineStats> {
    let start = Instant::now();
    let profile = &config.profile;
    let sectors = config.select_sectors(options.sectors.as_deref())?;
    let boundary = profile.history_start_ts()?;
    let window = profile.base_window();
    let mut stats = PipelineStats::new(sectors.len());

    info!(
        sectors = sectors.len(),
        series = %profile.series,
        timeframe = %profile.timeframe,
        scale_constant = profile.scale_constant,
        base_window = window,
        history_start = %profile.history_start,
        store = store.name(),
        "백필 시작"
    );

    if options.truncate {
        let deleted = store.truncate().await?;
        warn!(deleted, "기존 인덱스 행 전체 삭제");
    }

    let mut request = HistoryRequest::new(profile.timeframe, boundary, profile.page_size);
    if let Some(end) = options.end_time_ms {
        request = request.ending_at(end);
    }

    let writer = PersistenceWriter::new(store.clone(), profile.write_chunk_size);
    let mut sector_records: Vec<IndexRecord> = Vec::new();

    for (idx, sector) in sectors.iter().enumerate() {
        let span = index_core::pipeline_span!("backfill_sector", sector.key);
        async {
            info!(
                progress = format!("{}/{}", idx + 1, sectors.len()),
                name = sector.display_name(),
                symbols = sector.symbols.len(),
                "섹터 수집 시작"
            );

            let outcomes = fetch_sector_history(source, &sector.symbols, request).await;
            let all_failed = !outcomes.is_empty() && outcomes.iter().all(|o| o.is_failed());
            let per_symbol: Vec<Vec<Candle>> =
                outcomes.into_iter().map(|o| o.candles).collect();

            let series =
                aggregate_sector(&sector.key, profile.series, profile.timeframe, &per_symbol);

            if !series.has_data() {
                if all_failed {
                    warn!("모든 심볼 조회 실패, 섹터 건너뜀");
                    stats.record_failure(&sector.key, "FETCH_HISTORY", "all symbol fetches failed");
                } else {
                    warn!("데이터 없음, 섹터 건너뜀");
                    stats.sectors_empty += 1;
                }
                return;
            }

            let base = base_value(&series, window);
            let records = compute_records(&series, base, profile.scale_constant);

            let report = writer.write(&records).await;
            stats.write.merge(report);
            if report.written() == 0 && report.has_failures() {
                warn!(failed_chunks = report.failed_chunks, "섹터 행 저장 실패");
                stats.record_failure(
                    &sector.key,
                    "UPSERT",
                    format!("{} chunk(s) failed", report.failed_chunks),
                );
                return;
            }

            info!(
                buckets = series.len(),
                contributing_symbols = series.contributing_symbols,
                base,
                written = report.written(),
                "섹터 인덱스 저장 완료"
            );

            stats.sectors_processed += 1;
            stats.sector_records += records.len();
            sector_records.extend(records);
        }
        .instrument(span)
        .await;
    }

    let composite_input = if options.sectors.is_some() {
        match with_persisted_peers(store.as_ref(), config, &sectors, sector_records).await {
            Ok(input) => input,
            Err(e) => {
                warn!(error = %e, "다른 섹터 행 조회 실패, 컴포지트 재계산 건너뜀");
                stats.record_failure(COMPOSITE_KEY, "BUILD_COMPOSITE", e);
                stats.elapsed = start.elapsed();
                return Ok(stats);
            }
        }
    } else {
        sector_records
    };

    let composite = build_composite(&composite_input);
    stats.composite_records = composite.len();
    if !composite.is_empty() {
        let report = writer.write(&composite).await;
        if report.has_failures() {
            stats.record_failure(
                COMPOSITE_KEY,
                "UPSERT",
                format!("{} chunk(s) failed", report.failed_chunks),
            );
        }
        stats.write.merge(report);
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// 부분 백필 결과에 선택되지 않은 섹터의 저장된 행을 더합니다.
///
/// 이번에 기록한 시점의 행만 남기므로 컴포지트도 그 시점만 다시 계산됩니다.
async fn with_persisted_peers(
    store: &dyn IndexStore,
    config: &IndexConfig,
    selected: &[SectorDefinition],
    mut records: Vec<IndexRecord>,
) -> index_data::Result<Vec<IndexRecord>> {
    let timestamps: BTreeSet<i64> = records.iter().map(|r| r.timestamp).collect();
    let (Some(&from), Some(&to)) = (timestamps.first(), timestamps.last()) else {
        return Ok(records);
    };

    for peer in config
        .sectors
        .iter()
        .filter(|s| !selected.iter().any(|sel| sel.key == s.key))
    {
        let rows = store.series_between(&peer.key, from, to).await?;
        records.extend(rows.into_iter().filter(|r| timestamps.contains(&r.timestamp)));
    }

    info!(
        timestamps = timestamps.len(),
        rows = records.len(),
        "부분 백필 컴포지트 입력 구성"
    );
    Ok(records)
}
