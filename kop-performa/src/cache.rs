//! Read-through view cache
//!
//! Holds an organization's period list and its performa records for a short
//! TTL. Every mutation through the reconciler invalidates the entries it could
//! have changed, so reads after a write always go back to the backend.

use crate::models::{PerformaRecord, PeriodSummary};
use crate::period::PeriodKey;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

impl<T: Clone> Entry<T> {
    fn fresh(&self, ttl: Duration) -> Option<T> {
        (self.stored_at.elapsed() < ttl).then(|| self.value.clone())
    }
}

/// TTL cache of period lists and records, keyed by organization
///
/// Each organization carries a generation that every invalidation bumps.
/// Readers capture it with [`ViewCache::generation`] before going to the
/// backend and pass it back on store; a store whose generation is stale is
/// dropped, so a read that raced a write never repopulates the cache with
/// pre-write data.
pub struct ViewCache {
    ttl: Duration,
    generations: RwLock<HashMap<String, u64>>,
    periods: RwLock<HashMap<String, Entry<Vec<PeriodSummary>>>>,
    records: RwLock<HashMap<(String, PeriodKey), Entry<PerformaRecord>>>,
}

impl ViewCache {
    /// A zero `ttl` disables caching
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            generations: RwLock::new(HashMap::new()),
            periods: RwLock::new(HashMap::new()),
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Current invalidation generation of `org`
    pub async fn generation(&self, org: &str) -> u64 {
        self.generations.read().await.get(org).copied().unwrap_or(0)
    }

    async fn bump(&self, org: &str) {
        let mut generations = self.generations.write().await;
        *generations.entry(org.to_string()).or_insert(0) += 1;
    }

    pub async fn periods(&self, org: &str) -> Option<Vec<PeriodSummary>> {
        let periods = self.periods.read().await;
        periods.get(org).and_then(|entry| entry.fresh(self.ttl))
    }

    /// Store `org`'s period list read at `generation`
    pub async fn store_periods(&self, org: &str, generation: u64, value: Vec<PeriodSummary>) {
        if self.ttl.is_zero() {
            return;
        }
        // Checked under the map lock: an invalidation bumps first, then removes
        let mut periods = self.periods.write().await;
        if self.generation(org).await != generation {
            return;
        }
        let ttl = self.ttl;
        periods.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        periods.insert(
            org.to_string(),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub async fn record(&self, org: &str, period: &PeriodKey) -> Option<PerformaRecord> {
        let records = self.records.read().await;
        records
            .get(&(org.to_string(), *period))
            .and_then(|entry| entry.fresh(self.ttl))
    }

    /// Store the record of (org, period) read at `generation`
    pub async fn store_record(
        &self,
        org: &str,
        period: &PeriodKey,
        generation: u64,
        value: PerformaRecord,
    ) {
        if self.ttl.is_zero() {
            return;
        }
        let mut records = self.records.write().await;
        if self.generation(org).await != generation {
            return;
        }
        let ttl = self.ttl;
        records.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        records.insert(
            (org.to_string(), *period),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub async fn invalidate_periods(&self, org: &str) {
        self.bump(org).await;
        self.periods.write().await.remove(org);
    }

    pub async fn invalidate_record(&self, org: &str, period: &PeriodKey) {
        self.bump(org).await;
        self.records.write().await.remove(&(org.to_string(), *period));
    }

    /// Drop every cached record of `org`
    pub async fn invalidate_org_records(&self, org: &str) {
        self.bump(org).await;
        self.records.write().await.retain(|(owner, _), _| owner != org);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kop_common::Cadence;

    fn record(id: u64, periode: &str) -> PerformaRecord {
        serde_json::from_value(serde_json::json!({"id": id, "periode": periode})).unwrap()
    }

    fn key(raw: &str) -> PeriodKey {
        PeriodKey::parse(raw, Cadence::Monthly).unwrap()
    }

    #[tokio::test]
    async fn test_store_and_read_record() {
        let cache = ViewCache::new(Duration::from_secs(60));
        cache.store_record("7", &key("2024-05"), 0, record(1, "2024-05")).await;

        assert_eq!(cache.record("7", &key("2024-05")).await.map(|r| r.id), Some(1));
        assert!(cache.record("7", &key("2024-06")).await.is_none());
        assert!(cache.record("8", &key("2024-05")).await.is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let cache = ViewCache::new(Duration::ZERO);
        cache.store_periods("7", 0, Vec::new()).await;
        cache.store_record("7", &key("2024-05"), 0, record(1, "2024-05")).await;

        assert!(cache.periods("7").await.is_none());
        assert!(cache.record("7", &key("2024-05")).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_org_records_keeps_other_orgs() {
        let cache = ViewCache::new(Duration::from_secs(60));
        cache.store_record("7", &key("2024-05"), 0, record(1, "2024-05")).await;
        cache.store_record("7", &key("2024-06"), 0, record(2, "2024-06")).await;
        cache.store_record("9", &key("2024-05"), 0, record(3, "2024-05")).await;

        cache.invalidate_org_records("7").await;

        assert!(cache.record("7", &key("2024-05")).await.is_none());
        assert!(cache.record("7", &key("2024-06")).await.is_none());
        assert!(cache.record("9", &key("2024-05")).await.is_some());
    }

    #[tokio::test]
    async fn test_expired_entry_is_not_served() {
        let cache = ViewCache::new(Duration::from_millis(20));
        cache.store_periods("7", 0, Vec::new()).await;
        assert!(cache.periods("7").await.is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.periods("7").await.is_none());
    }

    #[tokio::test]
    async fn test_store_after_invalidation_is_dropped() {
        let cache = ViewCache::new(Duration::from_secs(60));
        let before = cache.generation("7").await;

        cache.invalidate_record("7", &key("2024-05")).await;
        cache.store_record("7", &key("2024-05"), before, record(1, "2024-05")).await;
        cache.store_periods("7", before, Vec::new()).await;

        assert!(cache.record("7", &key("2024-05")).await.is_none());
        assert!(cache.periods("7").await.is_none());

        let after = cache.generation("7").await;
        assert_ne!(before, after);
        cache.store_record("7", &key("2024-05"), after, record(1, "2024-05")).await;
        assert!(cache.record("7", &key("2024-05")).await.is_some());
    }

    #[tokio::test]
    async fn test_invalidation_leaves_other_org_generation() {
        let cache = ViewCache::new(Duration::from_secs(60));
        let other = cache.generation("9").await;

        cache.invalidate_periods("7").await;
        cache.store_periods("9", other, Vec::new()).await;

        assert!(cache.periods("9").await.is_some());
    }

    #[tokio::test]
    async fn test_store_prunes_expired_entries() {
        let cache = ViewCache::new(Duration::from_millis(20));
        cache.store_record("7", &key("2024-05"), 0, record(1, "2024-05")).await;
        cache.store_periods("7", 0, Vec::new()).await;

        tokio::time::sleep(Duration::from_millis(40)).await;
        cache.store_record("9", &key("2024-06"), 0, record(2, "2024-06")).await;
        cache.store_periods("9", 0, Vec::new()).await;

        assert_eq!(cache.records.read().await.len(), 1);
        assert_eq!(cache.periods.read().await.len(), 1);
    }
}
