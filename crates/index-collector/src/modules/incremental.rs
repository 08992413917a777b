//! 증분 업데이트 모듈.
//!
//! 섹터마다 최근 버킷만 조회하고, 저장된 가장 이른 유효 레코드에서 기준값과
//! 스케일 상수를 복원하여 과거 시드와 같은 스케일로 새 레코드를 계산합니다.
//!
//! 단계: `FETCH_RECENT → AGGREGATE → RECOVER_BASE → COMPUTE_INDEX → BUILD_COMPOSITE → UPSERT`

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use index_core::{
    aggregate_sector, build_composite, compute_records, recover_base, BaseSource, Candle,
    IndexConfig, IndexRecord, SectorDefinition,
};
use index_data::{IndexStore, PersistenceWriter};
use index_exchange::{fetch_sector_recent, KlineSource};
use serde::Serialize;
use tracing::{debug, info, warn, Instrument};

use crate::{PipelineStats, Result};

/// 증분 업데이트 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateStage {
    FetchRecent,
    Aggregate,
    RecoverBase,
    ComputeIndex,
    BuildComposite,
    Upsert,
}

impl UpdateStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStage::FetchRecent => "FETCH_RECENT",
            UpdateStage::Aggregate => "AGGREGATE",
            UpdateStage::RecoverBase => "RECOVER_BASE",
            UpdateStage::ComputeIndex => "COMPUTE_INDEX",
            UpdateStage::BuildComposite => "BUILD_COMPOSITE",
            UpdateStage::Upsert => "UPSERT",
        }
    }
}

impl fmt::Display for UpdateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 증분 업데이트 옵션
#[derive(Debug, Clone, Copy, Default)]
pub struct IncrementalOptions {
    /// 실행 예산. 소진되면 새 섹터를 시작하지 않습니다.
    pub budget: Option<Duration>,
}

/// 섹터 하나의 처리 결과
enum SectorOutcome {
    Written(Vec<IndexRecord>),
    Empty,
    Failed(UpdateStage, String),
}

/// 증분 업데이트 실행
///
/// 섹터 단위 실패는 통계에 기록하고 다음 섹터로 진행합니다.
/// 저장소에 연결할 수 없는 경우에만 에러를 반환합니다.
pub async fn run_incremental(
    store: Arc<dyn IndexStore>,
    source: &dyn KlineSource,
    config: &IndexConfig,
    options: IncrementalOptions,
) -> Result<PipelineStats> {
    let start = Instant::now();
    let deadline = options.budget.map(|budget| start + budget);
    let mut stats = PipelineStats::new(config.sectors.len());

    store.health_check().await?;

    let writer = PersistenceWriter::new(store.clone(), config.profile.write_chunk_size);
    let mut run_records: Vec<IndexRecord> = Vec::new();

    info!(
        sectors = config.sectors.len(),
        recent_limit = config.profile.recent_limit,
        budget_secs = options.budget.map(|b| b.as_secs()),
        "증분 업데이트 시작"
    );

    for sector in &config.sectors {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            warn!(sector = %sector.key, "실행 예산 소진, 남은 섹터는 다음 실행에서 처리");
            stats.budget_exhausted = true;
            break;
        }

        let span = index_core::pipeline_span!("incremental_sector", sector.key);
        let outcome = update_sector(store.as_ref(), &writer, source, config, sector, &mut stats)
            .instrument(span)
            .await;

        match outcome {
            SectorOutcome::Written(records) => {
                stats.sectors_processed += 1;
                run_records.extend(records);
            }
            SectorOutcome::Empty => stats.sectors_empty += 1,
            SectorOutcome::Failed(stage, error) => {
                warn!(sector = %sector.key, stage = %stage, error = %error, "섹터 업데이트 실패, 다음 섹터 진행");
                stats.record_failure(&sector.key, stage, error);
            }
        }
    }

    // BUILD_COMPOSITE
    let composite = build_composite(&run_records);
    stats.composite_records = composite.len();
    debug!(stage = %UpdateStage::BuildComposite, rows = composite.len(), "컴포지트 계산");

    // UPSERT (composite)
    if !composite.is_empty() {
        let report = writer.write(&composite).await;
        if report.has_failures() {
            stats.record_failure(
                index_core::COMPOSITE_KEY,
                UpdateStage::Upsert,
                format!("{} chunk(s) failed", report.failed_chunks),
            );
        }
        stats.write.merge(report);
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

async fn update_sector(
    store: &dyn IndexStore,
    writer: &PersistenceWriter,
    source: &dyn KlineSource,
    config: &IndexConfig,
    sector: &SectorDefinition,
    stats: &mut PipelineStats,
) -> SectorOutcome {
    let profile = &config.profile;

    // FETCH_RECENT
    let outcomes = fetch_sector_recent(
        source,
        &sector.symbols,
        profile.timeframe,
        profile.recent_limit,
    )
    .await;
    if !outcomes.is_empty() && outcomes.iter().all(|o| o.is_failed()) {
        return SectorOutcome::Failed(
            UpdateStage::FetchRecent,
            "all symbol fetches failed".to_string(),
        );
    }
    let per_symbol: Vec<Vec<Candle>> = outcomes.into_iter().map(|o| o.candles).collect();

    // AGGREGATE
    let series = aggregate_sector(&sector.key, profile.series, profile.timeframe, &per_symbol);
    if !series.has_data() {
        warn!(stage = %UpdateStage::Aggregate, "최근 데이터 없음");
        return SectorOutcome::Empty;
    }

    // RECOVER_BASE
    let earliest = match store.earliest_valid_record(&sector.key).await {
        Ok(earliest) => earliest,
        Err(e) => return SectorOutcome::Failed(UpdateStage::RecoverBase, e.to_string()),
    };
    let recovered = recover_base(earliest.as_ref(), series.first_value(), profile.scale_constant);
    if recovered.source == BaseSource::Fallback {
        warn!(
            stage = %UpdateStage::RecoverBase,
            base = recovered.base,
            "복원 가능한 저장 레코드 없음, 이번 배치의 첫 값을 기준값으로 사용 (스케일 리셋)"
        );
    }
    if (recovered.scale_constant - profile.scale_constant).abs() > f64::EPSILON {
        warn!(
            stored = recovered.scale_constant,
            configured = profile.scale_constant,
            "저장된 스케일 상수가 설정값과 다름, 저장된 값 사용"
        );
    }

    // COMPUTE_INDEX
    let records = compute_records(&series, recovered.base, recovered.scale_constant);
    if records.iter().any(|r| !r.index_value.is_finite()) {
        return SectorOutcome::Failed(
            UpdateStage::ComputeIndex,
            "non-finite index value".to_string(),
        );
    }
    stats.sector_records += records.len();

    // UPSERT
    let report = writer.write(&records).await;
    stats.write.merge(report);
    if report.written() == 0 && report.has_failures() {
        return SectorOutcome::Failed(
            UpdateStage::Upsert,
            format!("{} chunk(s) failed", report.failed_chunks),
        );
    }

    info!(
        rows = records.len(),
        base = recovered.base,
        base_source = ?recovered.source,
        "섹터 업데이트 완료"
    );

    SectorOutcome::Written(records)
}
