//! Delta result caching using Moka.
//!
//! Generating a delta means loading two blobs and running the encoder, so
//! both outcomes are remembered: the delta itself, or the fact that it was
//! not worth using.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tracing::debug;

use syncgate_shared::DeltaSettings;

use crate::attachment::ContentKey;

/// Default cache capacity (number of entries).
const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Default time-to-live for cache entries (1 hour).
const DEFAULT_TTL_SECS: u64 = 3600;

/// Result of a delta cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedDelta {
    /// A previously generated delta.
    Delta(Vec<u8>),
    /// A delta was generated before and judged not worth using.
    NotWorthIt,
    /// Nothing is known about this pair.
    Miss,
}

/// Read access to cached deltas keyed by `(source, target)`.
///
/// Entries are written by the delta codec, never by the resolver.
pub trait DeltaCache: Send + Sync {
    /// Look up the delta from `source` to `target`.
    fn get(
        &self,
        source: &ContentKey,
        target: &ContentKey,
    ) -> impl Future<Output = CachedDelta> + Send;
}

/// In-memory delta cache.
///
/// `None` values are negative entries. Thread-safe and suitable for
/// concurrent access; racing writers of the same pair are harmless.
#[derive(Clone)]
pub struct MemoryDeltaCache {
    cache: Cache<(ContentKey, ContentKey), Option<Arc<[u8]>>>,
}

impl MemoryDeltaCache {
    /// Creates a new delta cache with default settings.
    ///
    /// Default: 1000 entries max, 1 hour TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a new delta cache with custom configuration.
    ///
    /// # Arguments
    ///
    /// * `max_capacity` - Maximum number of entries to cache
    /// * `ttl_secs` - Time-to-live in seconds for each entry
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Creates a delta cache sized from the application settings.
    #[must_use]
    pub fn from_settings(settings: &DeltaSettings) -> Self {
        Self::with_config(settings.cache_capacity, settings.cache_ttl_secs)
    }

    /// Remembers a usable delta. An empty delta is stored as a negative entry.
    pub fn insert_delta(&self, source: &ContentKey, target: &ContentKey, delta: &[u8]) {
        if delta.is_empty() {
            self.insert_not_worth_it(source, target);
            return;
        }
        self.cache
            .insert((source.clone(), target.clone()), Some(Arc::from(delta)));
    }

    /// Remembers that the delta from `source` to `target` is not worth using.
    pub fn insert_not_worth_it(&self, source: &ContentKey, target: &ContentKey) {
        self.cache.insert((source.clone(), target.clone()), None);
    }

    /// Synchronous lookup.
    #[must_use]
    pub fn lookup(&self, source: &ContentKey, target: &ContentKey) -> CachedDelta {
        match self.cache.get(&(source.clone(), target.clone())) {
            Some(Some(delta)) => CachedDelta::Delta(delta.to_vec()),
            Some(None) => CachedDelta::NotWorthIt,
            None => CachedDelta::Miss,
        }
    }

    /// Invalidates all cached entries.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Returns the number of entries currently in the cache.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs cache maintenance tasks.
    ///
    /// Moka handles this automatically in the background, but calling
    /// this explicitly makes counts and invalidations visible immediately.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}

impl Default for MemoryDeltaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DeltaCache for MemoryDeltaCache {
    async fn get(&self, source: &ContentKey, target: &ContentKey) -> CachedDelta {
        let cached = self.lookup(source, target);
        if cached != CachedDelta::Miss {
            debug!(
                source = %source,
                target = %target,
                hit = cached_kind(&cached),
                "delta cache hit"
            );
        }
        cached
    }
}

fn cached_kind(cached: &CachedDelta) -> &'static str {
    match cached {
        CachedDelta::Delta(_) => "delta",
        CachedDelta::NotWorthIt => "not_worth_it",
        CachedDelta::Miss => "miss",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> (ContentKey, ContentKey) {
        (ContentKey::for_data(b"v1"), ContentKey::for_data(b"v2"))
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = MemoryDeltaCache::new();
        let (source, target) = keys();

        assert_eq!(cache.get(&source, &target).await, CachedDelta::Miss);

        cache.insert_delta(&source, &target, b"delta");
        assert_eq!(
            cache.get(&source, &target).await,
            CachedDelta::Delta(b"delta".to_vec())
        );
    }

    #[tokio::test]
    async fn test_negative_entry_is_distinct_from_miss() {
        let cache = MemoryDeltaCache::new();
        let (source, target) = keys();

        cache.insert_not_worth_it(&source, &target);
        assert_eq!(cache.get(&source, &target).await, CachedDelta::NotWorthIt);

        // Direction matters.
        assert_eq!(cache.get(&target, &source).await, CachedDelta::Miss);
    }

    #[test]
    fn test_empty_delta_stored_as_negative() {
        let cache = MemoryDeltaCache::new();
        let (source, target) = keys();

        cache.insert_delta(&source, &target, b"");
        assert_eq!(cache.lookup(&source, &target), CachedDelta::NotWorthIt);
    }

    #[test]
    fn test_invalidate_all() {
        let cache = MemoryDeltaCache::with_config(10, 60);
        let (source, target) = keys();

        cache.insert_delta(&source, &target, b"delta");
        cache.invalidate_all();
        cache.run_pending_tasks();

        assert_eq!(cache.lookup(&source, &target), CachedDelta::Miss);
    }

    #[test]
    fn test_entry_count() {
        let cache = MemoryDeltaCache::from_settings(&DeltaSettings::default());
        let (source, target) = keys();

        assert_eq!(cache.entry_count(), 0);
        cache.insert_not_worth_it(&source, &target);
        cache.run_pending_tasks();
        assert!(cache.entry_count() >= 1);
    }
}
