//! Caching module for aerostart-rs
//!
//! TTL micro-cache for relayed upstream responses, so bursts of identical
//! suggestion queries hit the upstream once.

use moka::future::Cache;
use std::time::Duration;

/// Cache for relayed suggestion response bodies
pub struct SuggestionCache {
    cache: Cache<String, String>,
}

impl SuggestionCache {
    /// Create a new cache with specified TTL
    pub fn new(ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(10_000)
            .build();

        Self { cache }
    }

    /// Get a cached response body
    pub async fn get(&self, key: &str) -> Option<String> {
        self.cache.get(key).await
    }

    /// Store a response body
    pub async fn set(&self, key: String, body: String) {
        self.cache.insert(key, body).await;
    }

    /// Clear the entire cache
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    /// Get cache size
    pub fn size(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for SuggestionCache {
    fn default() -> Self {
        Self::new(60)
    }
}

/// Generate a cache key for a relayed suggestion query
pub fn suggestion_cache_key(engine: &str, term: &str) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(engine.as_bytes());
    hasher.update(b":");
    hasher.update(term.as_bytes());

    format!("{:x}", hasher.finalize())
}
