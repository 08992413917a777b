//! 파이프라인 실행 통계 구조체.

use index_data::WriteReport;
use serde::Serialize;
use std::time::Duration;

/// 섹터 처리 실패 기록
#[derive(Debug, Clone, Serialize)]
pub struct SectorFailure {
    /// 섹터 키
    pub sector: String,
    /// 실패한 단계
    pub stage: String,
    /// 에러 메시지
    pub error: String,
}

/// 백필/증분 실행 통계
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    /// 대상 섹터 수
    pub sectors_total: usize,
    /// 레코드를 생성한 섹터 수
    pub sectors_processed: usize,
    /// 데이터가 없어 건너뛴 섹터 수
    pub sectors_empty: usize,
    /// 실패한 섹터 목록
    pub failures: Vec<SectorFailure>,
    /// 계산된 섹터 레코드 수
    pub sector_records: usize,
    /// 계산된 컴포지트 레코드 수
    pub composite_records: usize,
    /// 저장 결과 합계
    pub write: WriteReport,
    /// 실행 예산 소진으로 중단했는지 여부
    pub budget_exhausted: bool,
    /// 드라이런 여부
    pub dry_run: bool,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl PipelineStats {
    /// 새 통계 객체 생성
    pub fn new(sectors_total: usize) -> Self {
        Self {
            sectors_total,
            ..Self::default()
        }
    }

    /// 섹터 실패 기록
    pub fn record_failure(&mut self, sector: &str, stage: impl ToString, error: impl ToString) {
        self.failures.push(SectorFailure {
            sector: sector.to_string(),
            stage: stage.to_string(),
            error: error.to_string(),
        });
    }

    /// 실패한 섹터 수
    pub fn sectors_failed(&self) -> usize {
        self.failures.len()
    }

    /// 실제로 저장된 레코드 수
    pub fn records_updated(&self) -> usize {
        self.write.written()
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            sectors = self.sectors_total,
            processed = self.sectors_processed,
            empty = self.sectors_empty,
            failed = self.sectors_failed(),
            sector_records = self.sector_records,
            composite_records = self.composite_records,
            upserted = self.write.upserted,
            fallback_inserted = self.write.fallback_inserted,
            failed_chunks = self.write.failed_chunks,
            budget_exhausted = self.budget_exhausted,
            dry_run = self.dry_run,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "파이프라인 완료"
        );
    }
}
