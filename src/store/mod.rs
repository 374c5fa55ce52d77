//! Record store contract used by persisting production calls.
//!
//! The engine only ever needs "insert these rows into a named table and hand back
//! the canonical persisted rows". Counting and existence checks are exposed for
//! test assertions. `SeaOrmStore` is the default implementation.

pub mod database;

use async_trait::async_trait;

use crate::{error::FactoryError, field::Row};

pub use database::SeaOrmStore;

/// Persistence collaborator of the factory engine.
///
/// Every call is an independent statement; implementations must not wrap a
/// production tree in a transaction.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts `rows` into `table` and returns the persisted rows in input order.
    ///
    /// Returned rows include generated columns such as auto-increment identifiers.
    /// An empty `rows` returns an empty list without touching the store.
    async fn insert_returning(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, FactoryError>;

    /// Counts rows of `table` whose columns equal every entry of `filter`.
    ///
    /// A `null` filter value matches `NULL` columns.
    async fn count(&self, table: &str, filter: &Row) -> Result<u64, FactoryError>;

    /// Whether at least one row of `table` matches `filter`.
    async fn exists(&self, table: &str, filter: &Row) -> Result<bool, FactoryError> {
        Ok(self.count(table, filter).await? > 0)
    }

    /// Releases the underlying connection.
    async fn close(&self) -> Result<(), FactoryError> {
        Ok(())
    }
}
