//! 라우트 테스트 공용 도구.

use std::time::Duration;

use async_trait::async_trait;
use index_core::IndexRecord;
use index_data::{DataError, IndexStore, MemoryIndexStore, Result};

/// 모든 호출에 연결 실패를 반환하는 저장소.
pub(crate) struct DownStore;

fn refused<T>() -> Result<T> {
    Err(DataError::ConnectionError("connection refused".into()))
}

#[async_trait]
impl IndexStore for DownStore {
    fn name(&self) -> &str {
        "down"
    }
    async fn upsert_chunk(&self, _: &[IndexRecord]) -> Result<usize> {
        refused()
    }
    async fn insert_chunk(&self, _: &[IndexRecord]) -> Result<usize> {
        refused()
    }
    async fn earliest_valid_record(&self, _: &str) -> Result<Option<IndexRecord>> {
        refused()
    }
    async fn series_between(&self, _: &str, _: i64, _: i64) -> Result<Vec<IndexRecord>> {
        refused()
    }
    async fn latest_series(&self, _: &str, _: usize) -> Result<Vec<IndexRecord>> {
        refused()
    }
    async fn truncate(&self) -> Result<u64> {
        refused()
    }
    async fn count(&self) -> Result<u64> {
        refused()
    }
    async fn health_check(&self) -> Result<()> {
        refused()
    }
}

/// 기록마다 `delay`만큼 지연되는 메모리 저장소.
pub(crate) struct SlowStore {
    inner: MemoryIndexStore,
    delay: Duration,
}

impl SlowStore {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryIndexStore::new(),
            delay,
        }
    }
}

#[async_trait]
impl IndexStore for SlowStore {
    fn name(&self) -> &str {
        "slow"
    }
    async fn upsert_chunk(&self, records: &[IndexRecord]) -> Result<usize> {
        tokio::time::sleep(self.delay).await;
        self.inner.upsert_chunk(records).await
    }
    async fn insert_chunk(&self, records: &[IndexRecord]) -> Result<usize> {
        tokio::time::sleep(self.delay).await;
        self.inner.insert_chunk(records).await
    }
    async fn earliest_valid_record(&self, sector_key: &str) -> Result<Option<IndexRecord>> {
        self.inner.earliest_valid_record(sector_key).await
    }
    async fn series_between(&self, sector_key: &str, from: i64, to: i64) -> Result<Vec<IndexRecord>> {
        self.inner.series_between(sector_key, from, to).await
    }
    async fn latest_series(&self, sector_key: &str, limit: usize) -> Result<Vec<IndexRecord>> {
        self.inner.latest_series(sector_key, limit).await
    }
    async fn truncate(&self) -> Result<u64> {
        self.inner.truncate().await
    }
    async fn count(&self) -> Result<u64> {
        self.inner.count().await
    }
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
