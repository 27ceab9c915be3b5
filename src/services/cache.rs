use crate::models::Listing;
use crate::services::backend::ListingQuery;
use std::sync::Arc;
use std::time::Duration;

/// In-memory cache of listing query results
///
/// Keeps the raw (unfiltered) documents returned for a remote query so that
/// re-running a search with the same remote constraints, e.g. on every
/// keystroke in a text filter, does not hit the backend again.
#[derive(Clone)]
pub struct ListingCache {
    inner: moka::future::Cache<String, Arc<Vec<Listing>>>,
}

impl ListingCache {
    /// Create a new cache holding up to `capacity` query results
    pub fn new(capacity: u64, ttl_secs: u64) -> Self {
        let inner = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { inner }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<Vec<Listing>>> {
        let hit = self.inner.get(key).await;
        if hit.is_some() {
            tracing::trace!("Cache hit: {}", key);
        } else {
            tracing::trace!("Cache miss: {}", key);
        }
        hit
    }

    pub async fn insert(&self, key: String, listings: Arc<Vec<Listing>>) {
        tracing::trace!("Cache set: {}", key);
        self.inner.insert(key, listings).await;
    }

    /// Drop everything, e.g. after the user posts a new listing
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
        tracing::debug!("Invalidated listing cache");
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a listing query
    pub fn listings(query: &ListingQuery) -> String {
        format!("listings:{}", query.queries().join("|"))
    }
}
