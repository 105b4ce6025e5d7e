//! Caching module for TravelSearch-RS
//!
//! Time-bounded memo of prior location query results, shared by every
//! autocomplete widget in the process unless a caller injects its own.

use crate::locations::{LocationType, Suggestion};
use moka::future::Cache;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;

/// Default time-to-live for cached suggestions (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default upper bound on cached queries
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Process-wide cache, created empty on first use
static SHARED: OnceCell<SuggestionCache> = OnceCell::new();

/// Cache for location suggestions
///
/// Entries older than the TTL are never served. Clones share storage.
#[derive(Clone)]
pub struct SuggestionCache {
    cache: Cache<String, Arc<Vec<Suggestion>>>,
}

impl SuggestionCache {
    /// Create a new cache with the given TTL and capacity
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .build();

        Self { cache }
    }

    /// Handle to the process-wide instance
    pub fn shared() -> Self {
        SHARED.get_or_init(Self::default).clone()
    }

    /// Handle to the process-wide instance, creating it with the given
    /// TTL and capacity if this is the first use
    pub fn shared_with(ttl: Duration, max_capacity: u64) -> Self {
        SHARED
            .get_or_init(|| Self::new(ttl, max_capacity))
            .clone()
    }

    /// Get cached suggestions, `None` if absent or expired
    pub async fn get(&self, key: &str) -> Option<Arc<Vec<Suggestion>>> {
        self.cache.get(key).await
    }

    /// Store suggestions, replacing any entry under the same key
    pub async fn put(&self, key: String, suggestions: Arc<Vec<Suggestion>>) {
        self.cache.insert(key, suggestions).await;
    }

    /// Remove a cached entry
    pub async fn remove(&self, key: &str) {
        self.cache.remove(key).await;
    }
}

impl Default for SuggestionCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

/// Cache key for a query: trimmed, lowercased text plus the type filter
pub fn query_cache_key(query: &str, location_type: LocationType) -> String {
    format!("{}_{}", query.trim().to_lowercase(), location_type)
}
