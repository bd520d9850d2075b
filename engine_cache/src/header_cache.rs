use core::time::Duration;
use std::sync::Arc;

use cached::{Cached as _, TimedSizedCache};
use parking_lot::Mutex;
use prometheus_metrics::Metrics;
use types::{
    containers::ExecutionHeader,
    primitives::{ExecutionBlockHash, ExecutionBlockNumber},
};

pub const HEADER_CACHE_SIZE: usize = 20;
pub const HEADER_CACHE_LIFESPAN: Duration = Duration::from_secs(300);

#[derive(Clone, Copy, Debug)]
pub struct HeaderCacheConfig {
    pub capacity: usize,
    pub lifespan: Duration,
}

impl Default for HeaderCacheConfig {
    fn default() -> Self {
        Self {
            capacity: HEADER_CACHE_SIZE,
            lifespan: HEADER_CACHE_LIFESPAN,
        }
    }
}

/// Recently fetched execution headers, indexed both by number and by hash.
///
/// The two indices are bounded and expired separately. A header evicted from one index may
/// still be found through the other one.
pub struct HeaderCache {
    by_number: Mutex<TimedSizedCache<ExecutionBlockNumber, Arc<ExecutionHeader>>>,
    by_hash: Mutex<TimedSizedCache<ExecutionBlockHash, Arc<ExecutionHeader>>>,
    metrics: Option<Arc<Metrics>>,
}

impl Default for HeaderCache {
    fn default() -> Self {
        Self::new(HeaderCacheConfig::default(), None)
    }
}

impl HeaderCache {
    #[must_use]
    pub fn new(config: HeaderCacheConfig, metrics: Option<Arc<Metrics>>) -> Self {
        let HeaderCacheConfig { capacity, lifespan } = config;

        // `TimedSizedCache` panics when created with a size of 0.
        let capacity = capacity.max(1);

        Self {
            by_number: Mutex::new(TimedSizedCache::with_size_and_lifespan(capacity, lifespan)),
            by_hash: Mutex::new(TimedSizedCache::with_size_and_lifespan(capacity, lifespan)),
            metrics,
        }
    }

    #[must_use]
    pub fn get_by_number(&self, number: ExecutionBlockNumber) -> Option<Arc<ExecutionHeader>> {
        let header = self.by_number.lock().cache_get(&number).cloned();

        self.record_lookup("header_by_number", header.is_some());

        header
    }

    #[must_use]
    pub fn get_by_hash(&self, hash: ExecutionBlockHash) -> Option<Arc<ExecutionHeader>> {
        let header = self.by_hash.lock().cache_get(&hash).cloned();

        self.record_lookup("header_by_hash", header.is_some());

        header
    }

    pub fn add(&self, header: impl Into<Arc<ExecutionHeader>>) {
        let header = header.into();

        features::log!(
            DebugEngineCache,
            "caching execution header (number: {}, hash: {:?})",
            header.number,
            header.hash,
        );

        self.by_number
            .lock()
            .cache_set(header.number, Arc::clone(&header));

        self.by_hash.lock().cache_set(header.hash, header);
    }

    pub fn clear(&self) {
        self.by_number.lock().cache_clear();
        self.by_hash.lock().cache_clear();
    }

    fn record_lookup(&self, cache: &str, hit: bool) {
        if let Some(metrics) = self.metrics.as_ref() {
            metrics.register_cache_lookup(cache, hit);
        }
    }
}
