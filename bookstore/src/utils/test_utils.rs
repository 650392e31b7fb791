use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use common_database::CustomDatabaseError;
use common_redis::{Client as CacheClient, CustomRedisError};

use crate::books::book_models::Book;
use crate::books::book_store::BookStore;

#[derive(Debug, Clone)]
pub struct BookStoreCall {
    pub op: String,
    pub name: String,
}

/// Stateful in-memory `BookStore` for tests: rows live in a map keyed by
/// name, every call is recorded, and the next write can be forced to fail.
#[derive(Default)]
pub struct MockBookStore {
    rows: Mutex<HashMap<String, Book>>,
    calls: Mutex<Vec<BookStoreCall>>,
    fail_next_write: Mutex<bool>,
}

impl MockBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, book: Book) {
        self.lock(&self.rows).insert(book.name.clone(), book);
    }

    pub fn find_row(&self, name: &str) -> Option<Book> {
        self.lock(&self.rows).get(name).cloned()
    }

    pub fn get_calls(&self) -> Vec<BookStoreCall> {
        self.lock(&self.calls).clone()
    }

    /// Make the next mutating call return a database error.
    pub fn fail_next_write(&self) {
        *self.lock(&self.fail_next_write) = true;
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
        match mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn record(&self, op: &str, name: &str) {
        self.lock(&self.calls).push(BookStoreCall {
            op: op.to_string(),
            name: name.to_string(),
        });
    }

    fn take_write_failure(&self) -> Result<(), CustomDatabaseError> {
        let mut fail = self.lock(&self.fail_next_write);
        if *fail {
            *fail = false;
            return Err(CustomDatabaseError::Other(sqlx::Error::Protocol(
                "simulated database failure".to_string(),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl BookStore for MockBookStore {
    async fn insert_book(&self, book: &Book) -> Result<u64, CustomDatabaseError> {
        self.record("insert", &book.name);
        self.take_write_failure()?;
        self.lock(&self.rows).insert(book.name.clone(), book.clone());
        Ok(1)
    }

    async fn find_book_by_name(&self, name: &str) -> Result<Option<Book>, CustomDatabaseError> {
        self.record("find", name);
        Ok(self.lock(&self.rows).get(name).cloned())
    }

    async fn update_book(&self, book: &Book) -> Result<u64, CustomDatabaseError> {
        self.record("update", &book.name);
        self.take_write_failure()?;
        let mut rows = self.lock(&self.rows);
        match rows.get_mut(&book.name) {
            Some(row) => {
                row.price = book.price;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_book(&self, name: &str) -> Result<u64, CustomDatabaseError> {
        self.record("delete", name);
        self.take_write_failure()?;
        match self.lock(&self.rows).remove(name) {
            Some(_) => Ok(1),
            None => Ok(0),
        }
    }
}

/// Stateful cache with real get/set/del semantics (missing keys read as
/// `NotFound`, deleting them is fine). Complements the call-programmable
/// `common_redis::MockRedisClient` in end-to-end scenario tests.
#[derive(Default)]
pub struct InMemoryRedisClient {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryRedisClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl CacheClient for InMemoryRedisClient {
    async fn get(&self, k: String) -> Result<String, CustomRedisError> {
        match self.lock().get(&k) {
            Some(v) => Ok(v.clone()),
            None => Err(CustomRedisError::NotFound),
        }
    }

    async fn set(&self, k: String, v: String) -> Result<(), CustomRedisError> {
        self.lock().insert(k, v);
        Ok(())
    }

    async fn setex(&self, k: String, v: String, _seconds: u64) -> Result<(), CustomRedisError> {
        // TTL expiry is not simulated; tests only care about presence
        self.lock().insert(k, v);
        Ok(())
    }

    async fn del(&self, k: String) -> Result<(), CustomRedisError> {
        self.lock().remove(&k);
        Ok(())
    }
}
