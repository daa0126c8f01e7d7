//! Eviction of the response cache namespaces that depend on sales records.

use crate::cache::{CacheStore, SALES_AGGREGATE_NAMESPACE, SALES_RECORD_LIST_NAMESPACE};

/// Evict every cache namespace whose contents could be stale after a sales
/// record was created, updated, or deleted.
///
/// Every mutation entry point calls this synchronously after its commit
/// and before returning, so a read issued after the mutation's response
/// never observes stale cached data.
///
/// Failures are logged and swallowed: an unreachable cache store must not
/// turn a successful mutation into a visible error. Until the store
/// recovers or the entries expire, cached responses may be stale.
pub fn invalidate_sales_record_caches(cache: &dyn CacheStore) {
    for namespace in [SALES_RECORD_LIST_NAMESPACE, SALES_AGGREGATE_NAMESPACE] {
        let pattern = format!("*{namespace}*");

        if let Err(error) = cache.evict_pattern(&pattern) {
            tracing::error!("failed to invalidate sales record cache pattern {pattern}: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::invalidate_sales_record_caches;
    use crate::{
        cache::{CacheStore, MokaCacheStore},
        test_utils::{FailingCacheStore, RecordingCacheStore},
    };

    #[test]
    fn evicts_both_sales_namespaces() {
        let cache = RecordingCacheStore::default();

        invalidate_sales_record_caches(&cache);

        let patterns = cache.evicted_patterns();
        assert_eq!(
            patterns,
            vec![
                "*api_salesrecord_list*".to_owned(),
                "*api_salesdataaggregate_list*".to_owned(),
            ]
        );
    }

    #[test]
    fn removes_entries_from_both_namespaces() {
        let cache = MokaCacheStore::default();
        cache
            .put("api_salesrecord_list:sig", "list".to_owned())
            .unwrap();
        cache
            .put("api_salesdataaggregate_list:sig", "aggregate".to_owned())
            .unwrap();

        invalidate_sales_record_caches(&cache);

        assert_eq!(cache.get("api_salesrecord_list:sig").unwrap(), None);
        assert_eq!(cache.get("api_salesdataaggregate_list:sig").unwrap(), None);
    }

    #[test]
    fn cache_failure_does_not_propagate() {
        invalidate_sales_record_caches(&FailingCacheStore);
    }

    #[test]
    fn repeated_invalidation_is_idempotent() {
        let cache = MokaCacheStore::default();
        cache
            .put("api_salesrecord_list:sig", "list".to_owned())
            .unwrap();

        invalidate_sales_record_caches(&cache);
        invalidate_sales_record_caches(&cache);

        assert_eq!(cache.get("api_salesrecord_list:sig").unwrap(), None);
    }
}
