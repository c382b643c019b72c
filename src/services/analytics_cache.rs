//! Short-lived memoization of analytics responses
//!
//! Responses are cached as JSON keyed by endpoint and parameters. Any write
//! to products or sales clears the whole cache.
//!
//! Keys carry a generation number that `invalidate_all` bumps. A computation
//! that started before a write finishes under the old generation, so its
//! result is never visible to requests made after the write.

use moka::future::Cache;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub type ComputeError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone)]
pub struct AnalyticsCache {
    cache: Cache<String, serde_json::Value>,
    generation: Arc<AtomicU64>,
}

impl AnalyticsCache {
    pub fn new(ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(500)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            cache,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Return the cached response for `key`, or compute, cache and return it.
    /// Concurrent misses on one key share a single computation. Errors are
    /// not cached.
    pub async fn get_or_compute<T, F>(&self, key: String, compute: F) -> Result<serde_json::Value, Arc<ComputeError>>
    where
        T: Serialize,
        F: Future<Output = Result<T, ComputeError>>,
    {
        let key = format!("{}:{}", self.generation.load(Ordering::Acquire), key);

        self.cache
            .try_get_with(key.clone(), async {
                tracing::debug!("Analytics cache miss for {}", key);
                let value = compute.await?;
                Ok(serde_json::to_value(value)?)
            })
            .await
    }

    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cache.invalidate_all();
    }
}
