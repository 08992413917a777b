//! 응답 TTL 캐시.
//!
//! 차트 조회 결과를 짧게 보관합니다. 만료 판단은 주입된 [`Clock`]으로 하므로
//! 테스트에서는 [`ManualClock`]으로 시간을 직접 진행시킬 수 있습니다.
//!
//! [`TtlCache::clear`]는 세대를 올립니다. 조회를 시작할 때 받은 세대로만 저장할 수
//! 있으므로, 비우기 전에 시작된 조회가 비운 뒤에 오래된 값을 넣지 못합니다.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// 현재 시각 제공자.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// 실제 단조 시계.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// 수동으로 진행시키는 시계.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// 시계를 `by`만큼 앞으로 진행합니다.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + offset
    }
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

struct Slots<K, V> {
    entries: HashMap<K, Entry<V>>,
    generation: u64,
}

/// 키별 TTL 캐시.
pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slots: RwLock<Slots<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// 새 캐시 생성.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            slots: RwLock::new(Slots {
                entries: HashMap::new(),
                generation: 0,
            }),
        }
    }

    /// 시스템 시계를 쓰는 캐시 생성.
    pub fn with_system_clock(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    /// 유효한 항목을 반환합니다. 만료된 항목은 `None`입니다.
    pub async fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let slots = self.slots.read().await;
        slots
            .entries
            .get(key)
            .filter(|entry| now.duration_since(entry.stored_at) < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// 현재 세대. 원본을 조회하기 전에 받아 두었다가 [`insert`](Self::insert)에 넘깁니다.
    pub async fn generation(&self) -> u64 {
        self.slots.read().await.generation
    }

    /// 항목 저장. 같은 키의 기존 항목을 덮어씁니다.
    ///
    /// `generation` 이후에 [`clear`](Self::clear)가 있었으면 저장하지 않고 `false`를 반환합니다.
    pub async fn insert(&self, key: K, value: V, generation: u64) -> bool {
        let stored_at = self.clock.now();
        let mut slots = self.slots.write().await;
        if slots.generation != generation {
            return false;
        }
        // 쓰기 시점에 만료 항목 정리
        slots
            .entries
            .retain(|_, entry| stored_at.duration_since(entry.stored_at) < self.ttl);
        slots.entries.insert(key, Entry { value, stored_at });
        true
    }

    /// 모든 항목을 삭제하고 세대를 올립니다.
    pub async fn clear(&self) {
        let mut slots = self.slots.write().await;
        slots.entries.clear();
        slots.generation += 1;
    }

    /// 저장된 항목 수 (만료 항목 포함).
    pub async fn len(&self) -> usize {
        self.slots.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(ttl_secs: u64) -> (Arc<ManualClock>, TtlCache<String, u32>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::new(Duration::from_secs(ttl_secs), clock.clone());
        (clock, cache)
    }

    async fn put(cache: &TtlCache<String, u32>, key: &str, value: u32) {
        let generation = cache.generation().await;
        assert!(cache.insert(key.to_string(), value, generation).await);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let (clock, cache) = cache(60);
        put(&cache, "ALL", 7).await;

        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.get(&"ALL".to_string()).await, Some(7));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&"ALL".to_string()).await, None);
    }

    #[tokio::test]
    async fn test_insert_overwrites_and_refreshes() {
        let (clock, cache) = cache(10);
        put(&cache, "L1", 1).await;
        clock.advance(Duration::from_secs(8));
        put(&cache, "L1", 2).await;
        clock.advance(Duration::from_secs(8));

        assert_eq!(cache.get(&"L1".to_string()).await, Some(2));
    }

    #[tokio::test]
    async fn test_insert_evicts_expired_entries() {
        let (clock, cache) = cache(10);
        put(&cache, "L1", 1).await;
        clock.advance(Duration::from_secs(11));
        put(&cache, "DEFI", 2).await;

        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let (_clock, cache) = cache(10);
        put(&cache, "L1", 1).await;
        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_insert_after_clear_with_old_generation_is_dropped() {
        let (_clock, cache) = cache(60);
        let started = cache.generation().await;

        // 조회 도중 크론 실행이 캐시를 비움
        cache.clear().await;

        assert!(!cache.insert("ALL".to_string(), 1, started).await);
        assert_eq!(cache.get(&"ALL".to_string()).await, None);
        put(&cache, "ALL", 2).await;
        assert_eq!(cache.get(&"ALL".to_string()).await, Some(2));
    }
}
