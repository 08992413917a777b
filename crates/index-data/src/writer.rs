//! 인덱스 레코드 기록기.
//!
//! 배치를 청크로 나누어 저장소에 upsert합니다. 저장소에 고유 제약 조건이
//! 없으면 해당 청크를 일반 insert로 다시 기록하고, 그 밖의 청크 실패는
//! 기록만 하고 다음 청크를 계속 진행합니다.

use std::collections::BTreeMap;
use std::sync::Arc;

use index_core::IndexRecord;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::storage::IndexStore;

/// 기본 청크 크기.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// 배치 기록 결과.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteReport {
    /// upsert된 레코드 수
    pub upserted: usize,
    /// 고유 제약 조건 부재로 insert 폴백된 레코드 수
    pub fallback_inserted: usize,
    /// 실패한 청크 수
    pub failed_chunks: usize,
    /// 실패한 청크에 포함된 레코드 수
    pub failed_records: usize,
}

impl WriteReport {
    /// 실제로 기록된 레코드 수.
    pub fn written(&self) -> usize {
        self.upserted + self.fallback_inserted
    }

    pub fn has_failures(&self) -> bool {
        self.failed_chunks > 0
    }

    /// 다른 보고서를 합산합니다.
    pub fn merge(&mut self, other: WriteReport) {
        self.upserted += other.upserted;
        self.fallback_inserted += other.fallback_inserted;
        self.failed_chunks += other.failed_chunks;
        self.failed_records += other.failed_records;
    }
}

/// 청크 단위 idempotent 기록기.
#[derive(Clone)]
pub struct PersistenceWriter {
    store: Arc<dyn IndexStore>,
    chunk_size: usize,
}

impl PersistenceWriter {
    pub fn new(store: Arc<dyn IndexStore>, chunk_size: usize) -> Self {
        Self {
            store,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn store(&self) -> &Arc<dyn IndexStore> {
        &self.store
    }

    /// 레코드 배치를 기록합니다.
    ///
    /// 같은 키가 배치 안에 여러 번 있으면 마지막 값만 기록합니다.
    pub async fn write(&self, records: &[IndexRecord]) -> WriteReport {
        let mut report = WriteReport::default();
        if records.is_empty() {
            return report;
        }

        let deduped = dedupe_last_wins(records);
        if deduped.len() < records.len() {
            debug!(
                input = records.len(),
                unique = deduped.len(),
                "배치 내 중복 키 제거"
            );
        }

        let total_chunks = deduped.len().div_ceil(self.chunk_size);
        for (i, chunk) in deduped.chunks(self.chunk_size).enumerate() {
            match self.store.upsert_chunk(chunk).await {
                Ok(_) => report.upserted += chunk.len(),
                Err(e) if e.is_missing_constraint() => {
                    warn!(
                        chunk = i + 1,
                        total_chunks,
                        error = %e,
                        "고유 제약 조건 없음, insert로 폴백"
                    );
                    match self.store.insert_chunk(chunk).await {
                        Ok(_) => report.fallback_inserted += chunk.len(),
                        Err(e) => {
                            error!(chunk = i + 1, total_chunks, error = %e, "insert 폴백 실패");
                            report.failed_chunks += 1;
                            report.failed_records += chunk.len();
                        }
                    }
                }
                Err(e) => {
                    error!(chunk = i + 1, total_chunks, error = %e, "청크 upsert 실패");
                    report.failed_chunks += 1;
                    report.failed_records += chunk.len();
                }
            }
        }

        info!(
            store = self.store.name(),
            upserted = report.upserted,
            fallback_inserted = report.fallback_inserted,
            failed_chunks = report.failed_chunks,
            "인덱스 레코드 기록 완료"
        );

        report
    }
}

fn dedupe_last_wins(records: &[IndexRecord]) -> Vec<IndexRecord> {
    let mut by_key: BTreeMap<(&str, i64), &IndexRecord> = BTreeMap::new();
    for record in records {
        by_key.insert(record.key(), record);
    }
    by_key.into_values().cloned().collect()
}
