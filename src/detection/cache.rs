//! Result caching keyed by content fingerprint.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::CacheConfig;
use crate::detection::types::NormalizedResult;
use crate::observability::metrics;
use crate::store::{MemoryStore, Store};

/// A cached provider result and when it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub result: NormalizedResult,
    pub stored_at: Instant,
}

impl CacheEntry {
    fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }
}

/// TTL cache of normalized results.
///
/// No single-flight: concurrent misses for the same text each reach the provider,
/// and the last writer wins.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn Store<CacheEntry>>,
    ttl: Duration,
    cleanup_threshold: usize,
}

impl ResultCache {
    pub fn new(store: Arc<dyn Store<CacheEntry>>, ttl: Duration, cleanup_threshold: usize) -> Self {
        Self {
            store,
            ttl,
            cleanup_threshold,
        }
    }

    /// Process-local cache built from configuration.
    pub fn in_memory(config: &CacheConfig) -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            Duration::from_secs(config.ttl_secs),
            config.cleanup_threshold,
        )
    }

    pub fn get(&self, key: &str) -> Option<NormalizedResult> {
        self.get_at(key, Instant::now())
    }

    /// Look up `key` as of `now`. Entries at or past the TTL are misses.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<NormalizedResult> {
        let hit = self
            .store
            .get(key)
            .filter(|entry| entry.age_at(now) < self.ttl)
            .map(|entry| entry.result);
        metrics::record_cache_lookup(hit.is_some());
        hit
    }

    pub fn set(&self, key: String, result: NormalizedResult) {
        self.set_at(key, result, Instant::now());
    }

    /// Store `result` as of `now`, sweeping expired entries once the
    /// cache grows past its threshold.
    pub fn set_at(&self, key: String, result: NormalizedResult, now: Instant) {
        self.store.set(
            key,
            CacheEntry {
                result,
                stored_at: now,
            },
        );

        if self.store.len() > self.cleanup_threshold {
            let removed = self.purge_expired_at(now);
            tracing::debug!(removed, remaining = self.store.len(), "Swept expired cache entries");
        }
        metrics::record_cache_size(self.store.len());
    }

    /// Remove every entry older than the TTL. Returns how many were removed.
    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let ttl = self.ttl;
        self.store.retain(&mut |entry| entry.age_at(now) <= ttl)
    }

    pub fn purge_expired(&self) -> usize {
        let removed = self.purge_expired_at(Instant::now());
        metrics::record_cache_size(self.store.len());
        removed
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::{Confidence, Verdict, PROVIDER_TAG};

    fn sample(result_id: &str) -> NormalizedResult {
        NormalizedResult {
            verdict: Verdict::Human,
            ai_probability: 12.5,
            confidence: Confidence::High,
            feedback: "Looks human".into(),
            total_words: 4,
            ai_words: 0,
            human_words: 4,
            sentences: Vec::new(),
            highlighted_sentences: Vec::new(),
            result_id: result_id.into(),
            checked_at: chrono::Utc::now(),
            provider: PROVIDER_TAG.into(),
            raw: None,
        }
    }

    fn cache(ttl_secs: u64, threshold: usize) -> ResultCache {
        ResultCache::new(
            Arc::new(MemoryStore::new()),
            Duration::from_secs(ttl_secs),
            threshold,
        )
    }

    #[test]
    fn test_round_trip_within_ttl() {
        let cache = cache(60, 1000);
        let start = Instant::now();
        let result = sample("r1");

        cache.set_at("k".into(), result.clone(), start);
        let got = cache.get_at("k", start + Duration::from_secs(59)).unwrap();
        assert_eq!(got, result);
    }

    #[test]
    fn test_expired_is_miss() {
        let cache = cache(60, 1000);
        let start = Instant::now();
        cache.set_at("k".into(), sample("r1"), start);

        assert!(cache.get_at("k", start + Duration::from_secs(60)).is_none());
        assert!(cache.get_at("missing", start).is_none());
    }

    #[test]
    fn test_cleanup_over_threshold() {
        let cache = cache(60, 3);
        let start = Instant::now();
        for i in 0..3 {
            cache.set_at(format!("old{i}"), sample("old"), start);
        }
        assert_eq!(cache.len(), 3);

        // Fourth insert crosses the threshold after the old ones have expired
        let later = start + Duration::from_secs(61);
        cache.set_at("fresh".into(), sample("fresh"), later);
        assert_eq!(cache.len(), 1);
        assert!(cache.get_at("fresh", later).is_some());
    }

    #[test]
    fn test_no_cleanup_under_threshold() {
        let cache = cache(60, 10);
        let start = Instant::now();
        cache.set_at("old".into(), sample("old"), start);
        cache.set_at("new".into(), sample("new"), start + Duration::from_secs(120));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_purge_expired() {
        let cache = cache(60, 1000);
        let start = Instant::now();
        cache.set_at("a".into(), sample("a"), start);
        cache.set_at("b".into(), sample("b"), start + Duration::from_secs(30));

        let removed = cache.purge_expired_at(start + Duration::from_secs(80));
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
    }
}
