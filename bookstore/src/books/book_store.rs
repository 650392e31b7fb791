use async_trait::async_trait;
use common_database::{CustomDatabaseError, PostgresReader, PostgresWriter};
use metrics::counter;

use crate::books::book_models::Book;
use crate::metrics_consts::BOOK_DB_READS_COUNTER;

/// Columns the accessor reads and writes. `create_time` and `update_time`
/// are maintained by the database and stay out of every statement.
const BOOK_COLUMNS: &str = "name, price";

/// The relational boundary for book rows. Row-not-found is a value
/// (`Ok(None)`), never an error; write statements report rows affected.
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn insert_book(&self, book: &Book) -> Result<u64, CustomDatabaseError>;
    async fn find_book_by_name(&self, name: &str) -> Result<Option<Book>, CustomDatabaseError>;
    async fn update_book(&self, book: &Book) -> Result<u64, CustomDatabaseError>;
    async fn delete_book(&self, name: &str) -> Result<u64, CustomDatabaseError>;
}

/// Postgres implementation over separate reader/writer pools. Reads go to
/// the reader, mutations to the writer.
pub struct PostgresBookStore {
    reader: PostgresReader,
    writer: PostgresWriter,
}

impl PostgresBookStore {
    pub fn new(reader: PostgresReader, writer: PostgresWriter) -> Self {
        Self { reader, writer }
    }
}

#[async_trait]
impl BookStore for PostgresBookStore {
    async fn insert_book(&self, book: &Book) -> Result<u64, CustomDatabaseError> {
        let mut conn = self.writer.get_connection().await?;

        let query = format!("INSERT INTO book ({BOOK_COLUMNS}) VALUES ($1, $2)");
        let result = sqlx::query(&query)
            .bind(&book.name)
            .bind(book.price)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    async fn find_book_by_name(&self, name: &str) -> Result<Option<Book>, CustomDatabaseError> {
        let mut conn = self.reader.get_connection().await?;

        counter!(BOOK_DB_READS_COUNTER).increment(1);
        let query = format!("SELECT {BOOK_COLUMNS} FROM book WHERE name = $1 LIMIT 1");
        let row = sqlx::query_as::<_, Book>(&query)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row)
    }

    async fn update_book(&self, book: &Book) -> Result<u64, CustomDatabaseError> {
        let mut conn = self.writer.get_connection().await?;

        let result = sqlx::query("UPDATE book SET price = $1 WHERE name = $2")
            .bind(book.price)
            .bind(&book.name)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_book(&self, name: &str) -> Result<u64, CustomDatabaseError> {
        let mut conn = self.writer.get_connection().await?;

        let result = sqlx::query("DELETE FROM book WHERE name = $1")
            .bind(name)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}
