use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, trace};

use crate::TilerResult;
use crate::feature::{FeatureSource, SourceFeature};

/// Read-through cache of source features shared by all tile workers.
///
/// Lookups take a shared lock and population a single exclusive one. The cache
/// holds at most `max_entries` features: once full, new features are fetched
/// but not stored, and nothing is ever evicted.
#[derive(Debug)]
pub struct FeatureCache {
    entries: RwLock<HashMap<u64, Arc<SourceFeature>>>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FeatureCache {
    /// Creates a cache holding at most `max_entries` features, zero disables caching
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached feature, or fetches it from `source` and caches it if there is room
    pub fn get_or_fetch(
        &self,
        id: u64,
        source: &dyn FeatureSource,
    ) -> TilerResult<Option<Arc<SourceFeature>>> {
        let cached = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned();
        if let Some(feature) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!("Feature cache HIT for {id}");
            return Ok(Some(feature));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!("Feature cache MISS for {id}");
        let Some(feature) = source.feature(id)? else {
            return Ok(None);
        };

        if self.max_entries > 0 {
            let mut entries = self
                .entries
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if entries.len() < self.max_entries {
                entries.entry(id).or_insert_with(|| feature.clone());
                if entries.len() == self.max_entries {
                    debug!("Feature cache is full with {} features", self.max_entries);
                }
            }
        }
        Ok(Some(feature))
    }

    /// Number of cached features
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if nothing is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once no more features will be stored
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() >= self.max_entries
    }

    /// Maximum number of cached features
    #[must_use]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Number of lookups answered from the cache
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of lookups that went to the source
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{FeatureGeometry, MemorySource};

    fn source() -> MemorySource {
        MemorySource::new(
            (1..=3).map(|id| SourceFeature::new(id, FeatureGeometry::Points(vec![[0.0, 0.0]]))),
        )
    }

    #[test]
    fn counts_hits_and_misses() {
        let source = source();
        let cache = FeatureCache::new(10);
        assert!(cache.is_empty());
        assert_eq!(cache.get_or_fetch(1, &source).unwrap().unwrap().id, 1);
        assert_eq!(cache.get_or_fetch(1, &source).unwrap().unwrap().id, 1);
        assert!(cache.get_or_fetch(42, &source).unwrap().is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn stops_caching_when_full() {
        let source = source();
        let cache = FeatureCache::new(2);
        for id in 1..=3 {
            assert!(cache.get_or_fetch(id, &source).unwrap().is_some());
        }
        assert!(cache.is_full());
        assert_eq!(cache.len(), 2);

        // cached features stay, the third one is fetched every time
        cache.get_or_fetch(1, &source).unwrap();
        cache.get_or_fetch(3, &source).unwrap();
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 4);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn zero_size_disables_caching() {
        let source = source();
        let cache = FeatureCache::new(0);
        cache.get_or_fetch(1, &source).unwrap();
        cache.get_or_fetch(1, &source).unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.misses(), 2);
    }
}
