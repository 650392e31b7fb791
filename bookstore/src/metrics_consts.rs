// Book cache counters
pub const BOOK_CACHE_HIT_COUNTER: &str = "bookstore_book_cache_hit_total";
pub const BOOK_CACHE_MISS_COUNTER: &str = "bookstore_book_cache_miss_total";
pub const BOOK_CACHE_CORRUPTED_COUNTER: &str = "bookstore_book_cache_corrupted_total";
pub const BOOK_CACHE_ERRORS_COUNTER: &str = "bookstore_book_cache_errors_total";
pub const BOOK_CACHE_INVALIDATION_ERRORS_COUNTER: &str =
    "bookstore_book_cache_invalidation_errors_total";

// Store counters
pub const BOOK_DB_READS_COUNTER: &str = "bookstore_db_book_reads_total";
