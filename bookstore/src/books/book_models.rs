use serde::{Deserialize, Serialize};

/// One row of the `book` table. `name` is the natural key and never changes
/// once the row exists; updates only touch the value columns. The table's
/// `create_time`/`update_time` columns are database-managed and deliberately
/// absent here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    pub name: String,
    pub price: i64,
}
