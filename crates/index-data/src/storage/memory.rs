//! 프로세스 내 인덱스 저장소.
//!
//! 드라이런 백필과 테스트에서 PostgreSQL 대신 사용합니다.
//! [`MemoryIndexStore::without_unique_constraint`]는 고유 제약 조건이 없는
//! 테이블처럼 동작하여 insert 폴백 경로를 재현합니다.

use std::collections::BTreeMap;

use async_trait::async_trait;
use index_core::IndexRecord;
use tokio::sync::RwLock;

use super::IndexStore;
use crate::error::{DataError, Result};

#[derive(Debug, Default)]
struct Rows {
    /// 고유 제약 조건이 있을 때의 키 → 레코드
    keyed: BTreeMap<(String, i64), IndexRecord>,
    /// 고유 제약 조건이 없을 때 insert된 레코드 (중복 허용)
    appended: Vec<IndexRecord>,
}

impl Rows {
    fn all(&self) -> impl Iterator<Item = &IndexRecord> {
        self.keyed.values().chain(self.appended.iter())
    }
}

/// 메모리 인덱스 저장소.
#[derive(Debug)]
pub struct MemoryIndexStore {
    rows: RwLock<Rows>,
    unique_constraint: bool,
}

impl Default for MemoryIndexStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Rows::default()),
            unique_constraint: true,
        }
    }

    /// 고유 제약 조건이 없는 저장소 (upsert 불가).
    pub fn without_unique_constraint() -> Self {
        Self {
            rows: RwLock::new(Rows::default()),
            unique_constraint: false,
        }
    }

    /// 저장된 모든 레코드 (키, 시간 순).
    pub async fn snapshot(&self) -> Vec<IndexRecord> {
        let rows = self.rows.read().await;
        let mut all: Vec<IndexRecord> = rows.all().cloned().collect();
        all.sort_by(|a, b| {
            a.sector_key
                .cmp(&b.sector_key)
                .then(a.timestamp.cmp(&b.timestamp))
        });
        all
    }

    /// 특정 키의 레코드.
    pub async fn get(&self, sector_key: &str, timestamp: i64) -> Option<IndexRecord> {
        let rows = self.rows.read().await;
        let found = rows
            .all()
            .find(|r| r.sector_key == sector_key && r.timestamp == timestamp)
            .cloned();
        found
    }
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upsert_chunk(&self, records: &[IndexRecord]) -> Result<usize> {
        if !self.unique_constraint {
            return Err(DataError::MissingConstraint(
                "there is no unique or exclusion constraint matching the ON CONFLICT specification"
                    .to_string(),
            ));
        }

        let mut rows = self.rows.write().await;
        for record in records {
            rows.keyed
                .insert((record.sector_key.clone(), record.timestamp), record.clone());
        }
        Ok(records.len())
    }

    async fn insert_chunk(&self, records: &[IndexRecord]) -> Result<usize> {
        let mut rows = self.rows.write().await;
        if self.unique_constraint {
            if let Some(dup) = records
                .iter()
                .find(|r| rows.keyed.contains_key(&(r.sector_key.clone(), r.timestamp)))
            {
                return Err(DataError::DuplicateError(format!(
                    "({}, {})",
                    dup.sector_key, dup.timestamp
                )));
            }
            for record in records {
                rows.keyed
                    .insert((record.sector_key.clone(), record.timestamp), record.clone());
            }
        } else {
            rows.appended.extend(records.iter().cloned());
        }
        Ok(records.len())
    }

    async fn earliest_valid_record(&self, sector_key: &str) -> Result<Option<IndexRecord>> {
        let rows = self.rows.read().await;
        let earliest = rows
            .all()
            .filter(|r| r.sector_key == sector_key && r.can_recover_base())
            .min_by_key(|r| r.timestamp)
            .cloned();
        Ok(earliest)
    }

    async fn series_between(
        &self,
        sector_key: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<IndexRecord>> {
        let rows = self.rows.read().await;
        let mut series: Vec<IndexRecord> = rows
            .all()
            .filter(|r| r.sector_key == sector_key && (from..=to).contains(&r.timestamp))
            .cloned()
            .collect();
        series.sort_by_key(|r| r.timestamp);
        Ok(series)
    }

    async fn latest_series(&self, sector_key: &str, limit: usize) -> Result<Vec<IndexRecord>> {
        let rows = self.rows.read().await;
        let mut series: Vec<IndexRecord> = rows
            .all()
            .filter(|r| r.sector_key == sector_key)
            .cloned()
            .collect();
        series.sort_by_key(|r| r.timestamp);
        let skip = series.len().saturating_sub(limit);
        Ok(series.split_off(skip))
    }

    async fn truncate(&self) -> Result<u64> {
        let mut rows = self.rows.write().await;
        let deleted = (rows.keyed.len() + rows.appended.len()) as u64;
        *rows = Rows::default();
        Ok(deleted)
    }

    async fn count(&self) -> Result<u64> {
        let rows = self.rows.read().await;
        Ok((rows.keyed.len() + rows.appended.len()) as u64)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
