use std::sync::Arc;

use common_redis::{Client as CacheClient, CustomRedisError};
use metrics::counter;

use crate::api::errors::BookError;
use crate::books::book_models::Book;
use crate::books::book_store::BookStore;
use crate::metrics_consts::{
    BOOK_CACHE_CORRUPTED_COUNTER, BOOK_CACHE_ERRORS_COUNTER, BOOK_CACHE_HIT_COUNTER,
    BOOK_CACHE_INVALIDATION_ERRORS_COUNTER, BOOK_CACHE_MISS_COUNTER,
};

/// Cache key namespace for book snapshots. Key derivation must stay a pure
/// function of the natural key: every access path (read, update, delete) has
/// to land on the same key, and the cache client's duplicate suppression for
/// in-flight lookups only works if a record is never double-keyed.
pub const BOOK_CACHE_PREFIX: &str = "cache:book:name:";

/// Read-through / write-invalidate accessor for book rows.
///
/// The relational store is the system of record; the cache holds disposable
/// JSON snapshots populated lazily on read. Mutations write to the store
/// first and then delete the snapshot - never refresh it in place - so a
/// failed store write leaves the cache stale-but-correct.
pub struct CachedBookModel {
    store: Arc<dyn BookStore + Send + Sync>,
    cache: Arc<dyn CacheClient + Send + Sync>,
    cache_ttl_seconds: Option<u64>,
}

impl CachedBookModel {
    pub fn new(
        store: Arc<dyn BookStore + Send + Sync>,
        cache: Arc<dyn CacheClient + Send + Sync>,
        cache_ttl_seconds: Option<u64>,
    ) -> Self {
        Self {
            store,
            cache,
            cache_ttl_seconds,
        }
    }

    fn cache_key(name: &str) -> String {
        format!("{BOOK_CACHE_PREFIX}{name}")
    }

    /// Insert a new book row, returning rows affected. The cache is not
    /// touched; the entry appears on first read.
    pub async fn insert(&self, book: &Book) -> Result<u64, BookError> {
        Ok(self.store.insert_book(book).await?)
    }

    /// Read-through lookup by name. A cache hit skips the store entirely; a
    /// miss falls back to a single-row select and populates the cache
    /// best-effort. A missing row is the distinguished `NotFound`, never a
    /// raw store signal.
    pub async fn find_one(&self, name: &str) -> Result<Book, BookError> {
        let cache_key = Self::cache_key(name);

        match self.cache.get(cache_key.clone()).await {
            Ok(cached) => match serde_json::from_str::<Book>(&cached) {
                Ok(book) => {
                    counter!(BOOK_CACHE_HIT_COUNTER).increment(1);
                    return Ok(book);
                }
                Err(e) => {
                    // Corrupted snapshot: fall through and refresh from the store
                    counter!(BOOK_CACHE_CORRUPTED_COUNTER).increment(1);
                    tracing::warn!("corrupted cache entry for book {name}, refreshing: {e}");
                }
            },
            Err(CustomRedisError::NotFound) => {
                counter!(BOOK_CACHE_MISS_COUNTER).increment(1);
            }
            Err(e) => {
                // Cache infrastructure trouble degrades to a direct store read
                counter!(BOOK_CACHE_ERRORS_COUNTER).increment(1);
                tracing::warn!("book cache read failed for {name}: {e}");
            }
        }

        let book = match self.store.find_book_by_name(name).await? {
            Some(book) => book,
            None => return Err(BookError::NotFound),
        };

        if let Err(e) = self.populate_cache(&cache_key, &book).await {
            tracing::warn!("failed to populate book cache for {name}: {e}");
        }

        Ok(book)
    }

    /// Update the value columns of an existing row by name, then drop the
    /// cache entry. The store write always comes first: if it fails the
    /// entry is left alone, and if invalidation fails afterwards the caller
    /// sees `BookError::Cache` even though the row was written.
    pub async fn update(&self, book: &Book) -> Result<(), BookError> {
        self.store.update_book(book).await?;
        self.invalidate(&book.name).await
    }

    /// Delete a row by name, then drop the cache entry. Same ordering and
    /// partial-failure contract as `update`.
    pub async fn delete(&self, name: &str) -> Result<(), BookError> {
        self.store.delete_book(name).await?;
        self.invalidate(name).await
    }

    async fn populate_cache(&self, cache_key: &str, book: &Book) -> Result<(), CustomRedisError> {
        let serialized = serde_json::to_string(book)
            .map_err(|e| CustomRedisError::ParseError(e.to_string()))?;

        match self.cache_ttl_seconds {
            Some(ttl) => self.cache.setex(cache_key.to_string(), serialized, ttl).await,
            None => self.cache.set(cache_key.to_string(), serialized).await,
        }
    }

    async fn invalidate(&self, name: &str) -> Result<(), BookError> {
        match self.cache.del(Self::cache_key(name)).await {
            // An absent entry is already invalid
            Ok(()) | Err(CustomRedisError::NotFound) => Ok(()),
            Err(e) => {
                counter!(BOOK_CACHE_INVALIDATION_ERRORS_COUNTER).increment(1);
                Err(BookError::Cache(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{InMemoryRedisClient, MockBookStore};
    use common_redis::{MockRedisClient, MockRedisValue};

    fn book(name: &str, price: i64) -> Book {
        Book {
            name: name.to_string(),
            price,
        }
    }

    fn model(
        store: Arc<MockBookStore>,
        cache: MockRedisClient,
        ttl: Option<u64>,
    ) -> CachedBookModel {
        CachedBookModel::new(store, Arc::new(cache), ttl)
    }

    #[test]
    fn test_cache_key_is_prefix_plus_name() {
        assert_eq!(CachedBookModel::cache_key("b1"), "cache:book:name:b1");
        // Same name, same key, every time
        assert_eq!(
            CachedBookModel::cache_key("b1"),
            CachedBookModel::cache_key("b1")
        );
    }

    #[tokio::test]
    async fn test_find_one_cache_hit_skips_store() {
        let store = Arc::new(MockBookStore::new());
        let cached = book("b1", 100);

        let mut cache = MockRedisClient::new();
        let cache = cache.get_ret(
            "cache:book:name:b1",
            Ok(serde_json::to_string(&cached).unwrap()),
        );

        let model = model(store.clone(), cache, Some(300));

        let found = model.find_one("b1").await.unwrap();
        assert_eq!(found, cached);
        assert!(store.get_calls().is_empty(), "store must not be consulted on a hit");
    }

    #[tokio::test]
    async fn test_find_one_miss_loads_and_populates_cache() {
        let store = Arc::new(MockBookStore::new());
        store.seed(book("b1", 100));

        let cache = MockRedisClient::new();
        let model = model(store.clone(), cache.clone(), Some(300));

        let found = model.find_one("b1").await.unwrap();
        assert_eq!(found, book("b1", 100));

        let calls = cache.get_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].op, "get");
        assert_eq!(calls[1].op, "setex");
        assert_eq!(calls[1].key, "cache:book:name:b1");
        assert!(matches!(
            &calls[1].value,
            MockRedisValue::StringWithTTL(v, 300)
                if *v == serde_json::to_string(&book("b1", 100)).unwrap()
        ));
    }

    #[tokio::test]
    async fn test_find_one_without_ttl_uses_plain_set() {
        let store = Arc::new(MockBookStore::new());
        store.seed(book("b1", 100));

        let cache = MockRedisClient::new();
        let model = model(store.clone(), cache.clone(), None);

        model.find_one("b1").await.unwrap();

        let calls = cache.get_calls();
        assert_eq!(calls[1].op, "set");
    }

    #[tokio::test]
    async fn test_find_one_unknown_book_is_not_found() {
        let store = Arc::new(MockBookStore::new());
        let model = model(store, MockRedisClient::new(), Some(300));

        let result = model.find_one("missing").await;
        assert!(matches!(result, Err(BookError::NotFound)));
    }

    #[tokio::test]
    async fn test_find_one_cache_write_failure_does_not_fail_read() {
        let store = Arc::new(MockBookStore::new());
        store.seed(book("b1", 100));

        let mut cache = MockRedisClient::new();
        let cache = cache.set_ret("cache:book:name:b1", Err(CustomRedisError::Timeout));

        let model = model(store, cache, Some(300));

        let found = model.find_one("b1").await.unwrap();
        assert_eq!(found, book("b1", 100));
    }

    #[tokio::test]
    async fn test_find_one_corrupted_entry_refreshes_from_store() {
        let store = Arc::new(MockBookStore::new());
        store.seed(book("b1", 100));

        let mut cache = MockRedisClient::new();
        let cache = cache.get_ret("cache:book:name:b1", Ok("not json{".to_string()));

        let model = model(store.clone(), cache.clone(), Some(300));

        let found = model.find_one("b1").await.unwrap();
        assert_eq!(found, book("b1", 100));

        // Store consulted and snapshot rewritten
        assert_eq!(store.get_calls().len(), 1);
        let calls = cache.get_calls();
        assert_eq!(calls[1].op, "setex");
    }

    #[tokio::test]
    async fn test_find_one_cache_unavailable_falls_back_to_store() {
        let store = Arc::new(MockBookStore::new());
        store.seed(book("b1", 100));

        let mut cache = MockRedisClient::new();
        let cache = cache.get_ret("cache:book:name:b1", Err(CustomRedisError::Timeout));

        let model = model(store, cache, Some(300));

        let found = model.find_one("b1").await.unwrap();
        assert_eq!(found, book("b1", 100));
    }

    #[tokio::test]
    async fn test_insert_never_touches_the_cache() {
        let store = Arc::new(MockBookStore::new());
        let cache = MockRedisClient::new();
        let model = model(store.clone(), cache.clone(), Some(300));

        let rows = model.insert(&book("b1", 100)).await.unwrap();
        assert_eq!(rows, 1);
        assert!(cache.get_calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_writes_store_then_invalidates() {
        let store = Arc::new(MockBookStore::new());
        store.seed(book("b1", 100));

        let mut cache = MockRedisClient::new();
        let cache = cache.del_ret("cache:book:name:b1", Ok(()));

        let model = model(store.clone(), cache.clone(), Some(300));

        model.update(&book("b1", 200)).await.unwrap();

        assert_eq!(store.find_row("b1"), Some(book("b1", 200)));
        let calls = cache.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].op, "del");
        assert_eq!(calls[0].key, "cache:book:name:b1");
    }

    #[tokio::test]
    async fn test_update_invalidates_even_when_row_is_absent() {
        let store = Arc::new(MockBookStore::new());

        let mut cache = MockRedisClient::new();
        let cache = cache.del_ret("cache:book:name:ghost", Ok(()));

        let model = model(store, cache.clone(), Some(300));

        model.update(&book("ghost", 1)).await.unwrap();
        assert_eq!(cache.get_calls()[0].op, "del");
    }

    #[tokio::test]
    async fn test_update_store_failure_skips_invalidation() {
        let store = Arc::new(MockBookStore::new());
        store.seed(book("b1", 100));
        store.fail_next_write();

        let cache = MockRedisClient::new();
        let model = model(store.clone(), cache.clone(), Some(300));

        let result = model.update(&book("b1", 200)).await;
        assert!(matches!(result, Err(BookError::Database(_))));

        // The write never landed and the cache entry was left alone
        assert_eq!(store.find_row("b1"), Some(book("b1", 100)));
        assert!(cache.get_calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_invalidation_failure_surfaces_after_successful_write() {
        let store = Arc::new(MockBookStore::new());
        store.seed(book("b1", 100));

        let mut cache = MockRedisClient::new();
        let cache = cache.del_ret("cache:book:name:b1", Err(CustomRedisError::Timeout));

        let model = model(store.clone(), cache, Some(300));

        let result = model.update(&book("b1", 200)).await;
        assert!(matches!(result, Err(BookError::Cache(_))));

        // The row reflects the new value even though update reported a failure
        assert_eq!(store.find_row("b1"), Some(book("b1", 200)));
    }

    #[tokio::test]
    async fn test_delete_writes_store_then_invalidates() {
        let store = Arc::new(MockBookStore::new());
        store.seed(book("b1", 100));

        let mut cache = MockRedisClient::new();
        let cache = cache.del_ret("cache:book:name:b1", Ok(()));

        let model = model(store.clone(), cache.clone(), Some(300));

        model.delete("b1").await.unwrap();
        assert_eq!(store.find_row("b1"), None);
        assert_eq!(cache.get_calls()[0].op, "del");
    }

    #[tokio::test]
    async fn test_delete_with_absent_cache_entry_is_a_noop() {
        let store = Arc::new(MockBookStore::new());
        store.seed(book("b1", 100));

        // Unconfigured mock del returns NotFound, which must not surface
        let model = model(store, MockRedisClient::new(), Some(300));

        assert!(model.delete("b1").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_invalidation_failure_surfaces() {
        let store = Arc::new(MockBookStore::new());
        store.seed(book("b1", 100));

        let mut cache = MockRedisClient::new();
        let cache = cache.del_ret("cache:book:name:b1", Err(CustomRedisError::Timeout));

        let model = model(store.clone(), cache, Some(300));

        let result = model.delete("b1").await;
        assert!(matches!(result, Err(BookError::Cache(_))));
        assert_eq!(store.find_row("b1"), None);
    }

    #[tokio::test]
    async fn test_insert_find_update_find_delete_scenario() {
        let store = Arc::new(MockBookStore::new());
        let cache = Arc::new(InMemoryRedisClient::new());
        let model = CachedBookModel::new(store.clone(), cache.clone(), Some(300));

        assert!(matches!(
            model.find_one("b1").await,
            Err(BookError::NotFound)
        ));

        model.insert(&book("b1", 100)).await.unwrap();
        assert_eq!(model.find_one("b1").await.unwrap(), book("b1", 100));

        // The miss populated the cache with the same value fields
        let snapshot = cache.get("cache:book:name:b1".to_string()).await.unwrap();
        assert_eq!(
            serde_json::from_str::<Book>(&snapshot).unwrap(),
            book("b1", 100)
        );

        // After an update the stale snapshot must be gone: the next read may
        // never observe the pre-update price
        model.update(&book("b1", 200)).await.unwrap();
        assert!(matches!(
            cache.get("cache:book:name:b1".to_string()).await,
            Err(CustomRedisError::NotFound)
        ));
        assert_eq!(model.find_one("b1").await.unwrap(), book("b1", 200));

        model.delete("b1").await.unwrap();
        assert!(matches!(
            model.find_one("b1").await,
            Err(BookError::NotFound)
        ));
    }
}
