//! The response cache for the sales data endpoints.
//!
//! Computed list and aggregate payloads are stored under a key derived
//! from the endpoint's namespace and a deterministic signature of the
//! accepted query parameters. Caching is best-effort: a failing cache
//! store degrades reads to direct computation and never fails a request.

use std::time::Duration;

use globset::Glob;

use crate::Error;

/// The cache namespace for the sales record listing endpoint.
pub const SALES_RECORD_LIST_NAMESPACE: &str = "api_salesrecord_list";

/// The cache namespace for the sales data aggregation endpoint.
pub const SALES_AGGREGATE_NAMESPACE: &str = "api_salesdataaggregate_list";

/// How long cached responses live when nothing invalidates them sooner.
pub const RESPONSE_TTL: Duration = Duration::from_secs(20 * 60);

/// A TTL'd key-value store for serialized response payloads with
/// pattern-based bulk eviction.
pub trait CacheStore: Send + Sync {
    /// Look up the payload stored under `key`. Expired entries behave as
    /// absent.
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store `payload` under `key`, overwriting any existing entry.
    fn put(&self, key: &str, payload: String) -> Result<(), Error>;

    /// Remove every entry whose key matches the glob `pattern`, e.g.
    /// `*api_salesrecord_list*`.
    fn evict_pattern(&self, pattern: &str) -> Result<(), Error>;
}

/// The full cache key for a request: namespace plus parameter signature.
pub fn entry_key(namespace: &str, signature: &str) -> String {
    format!("{namespace}:{signature}")
}

/// A deterministic, order-independent signature of the given query
/// parameters.
///
/// Parameters are sorted by name before encoding, so two logically
/// identical requests produce the same signature regardless of parameter
/// order, while any differing value produces a different one.
pub fn query_signature(params: &[(&str, &str)]) -> String {
    let mut sorted = params.to_vec();
    sorted.sort();

    let encoded = serde_urlencoded::to_string(&sorted).unwrap_or_default();

    format!("{:x}", md5::compute(encoded))
}

/// Read `key` from the cache, treating a cache failure as a miss.
pub fn fetch(store: &dyn CacheStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(hit) => hit,
        Err(error) => {
            tracing::warn!("cache read failed for {key}: {error}");
            None
        }
    }
}

/// Write `payload` to the cache under `key`, logging and discarding any
/// cache failure.
pub fn store(store: &dyn CacheStore, key: &str, payload: &str) {
    if let Err(error) = store.put(key, payload.to_owned()) {
        tracing::warn!("cache write failed for {key}: {error}");
    }
}

/// An in-process [CacheStore] backed by a moka TTL cache.
pub struct MokaCacheStore {
    cache: moka::sync::Cache<String, String>,
}

impl MokaCacheStore {
    /// Create a cache whose entries expire `ttl` after they are written.
    pub fn new(ttl: Duration) -> Self {
        let cache = moka::sync::Cache::builder()
            .max_capacity(64 * 1024 * 1024)
            .weigher(|key: &String, payload: &String| (key.len() + payload.len()) as u32)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();

        Self { cache }
    }
}

impl Default for MokaCacheStore {
    fn default() -> Self {
        Self::new(RESPONSE_TTL)
    }
}

impl CacheStore for MokaCacheStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.cache.get(key))
    }

    fn put(&self, key: &str, payload: String) -> Result<(), Error> {
        self.cache.insert(key.to_owned(), payload);

        Ok(())
    }

    fn evict_pattern(&self, pattern: &str) -> Result<(), Error> {
        let matcher = Glob::new(pattern)
            .map_err(|error| Error::Cache(error.to_string()))?
            .compile_matcher();

        self.cache
            .invalidate_entries_if(move |key, _| matcher.is_match(key))
            .map_err(|error| Error::Cache(error.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{
        CacheStore, MokaCacheStore, SALES_RECORD_LIST_NAMESPACE, entry_key, fetch, query_signature,
        store,
    };
    use crate::test_utils::FailingCacheStore;

    #[test]
    fn signature_is_order_independent() {
        let forwards = query_signature(&[("start_date", "2024-09-01"), ("category", "Tools")]);
        let backwards = query_signature(&[("category", "Tools"), ("start_date", "2024-09-01")]);

        assert_eq!(forwards, backwards);
    }

    #[test]
    fn signature_differs_when_any_value_differs() {
        let base = query_signature(&[("start_date", "2024-09-01"), ("page", "1")]);
        let other_date = query_signature(&[("start_date", "2024-09-02"), ("page", "1")]);
        let other_page = query_signature(&[("start_date", "2024-09-01"), ("page", "2")]);

        assert_ne!(base, other_date);
        assert_ne!(base, other_page);
    }

    #[test]
    fn signature_differs_when_a_parameter_is_added() {
        let base = query_signature(&[("page", "1")]);
        let with_category = query_signature(&[("page", "1"), ("category", "")]);

        assert_ne!(base, with_category);
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = MokaCacheStore::default();
        let key = entry_key(SALES_RECORD_LIST_NAMESPACE, "abc123");

        cache.put(&key, "[1, 2, 3]".to_owned()).unwrap();

        assert_eq!(cache.get(&key).unwrap(), Some("[1, 2, 3]".to_owned()));
    }

    #[test]
    fn put_overwrites_existing_entries() {
        let cache = MokaCacheStore::default();

        cache.put("key", "old".to_owned()).unwrap();
        cache.put("key", "new".to_owned()).unwrap();

        assert_eq!(cache.get("key").unwrap(), Some("new".to_owned()));
    }

    #[test]
    fn expired_entries_behave_as_absent() {
        let cache = MokaCacheStore::new(Duration::from_millis(1));

        cache.put("key", "payload".to_owned()).unwrap();
        std::thread::sleep(Duration::from_millis(10));

        assert_eq!(cache.get("key").unwrap(), None);
    }

    #[test]
    fn evict_pattern_removes_matching_namespace_only() {
        let cache = MokaCacheStore::default();

        cache
            .put("api_salesrecord_list:aaa", "list".to_owned())
            .unwrap();
        cache
            .put("api_salesrecord_list:bbb", "list".to_owned())
            .unwrap();
        cache
            .put("api_salesdataaggregate_list:aaa", "aggregate".to_owned())
            .unwrap();

        cache.evict_pattern("*api_salesrecord_list*").unwrap();

        assert_eq!(cache.get("api_salesrecord_list:aaa").unwrap(), None);
        assert_eq!(cache.get("api_salesrecord_list:bbb").unwrap(), None);
        assert_eq!(
            cache.get("api_salesdataaggregate_list:aaa").unwrap(),
            Some("aggregate".to_owned())
        );
    }

    #[test]
    fn evicting_an_empty_namespace_is_harmless() {
        let cache = MokaCacheStore::default();

        cache.evict_pattern("*api_salesrecord_list*").unwrap();
        cache.evict_pattern("*api_salesrecord_list*").unwrap();
    }

    #[test]
    fn fetch_treats_store_failure_as_a_miss() {
        let store = FailingCacheStore;

        assert_eq!(fetch(&store, "key"), None);
    }

    #[test]
    fn store_swallows_store_failure() {
        let failing = FailingCacheStore;

        store(&failing, "key", "payload");
    }
}
