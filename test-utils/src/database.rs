//! Row assertions against the test database.
//!
//! Filters are JSON objects mapping column names to expected values, matched with
//! equality (`null` matches `NULL`). Counts go through the record store of the
//! factory configuration, the same path the factories write through.

use factorify::{RecordStore, Row};
use serde_json::Value;

use crate::{context::TestContext, error::TestError};

fn to_filter(filter: Value) -> Row {
    match filter {
        Value::Object(row) => row,
        _ => Row::new(),
    }
}

impl TestContext {
    /// Counts rows of `table` matching `filter`.
    ///
    /// # Arguments
    /// - `table` - Table name
    /// - `filter` - JSON object of column/value pairs; any non-object matches all rows
    ///
    /// # Returns
    /// - `Ok(u64)` - Number of matching rows
    /// - `Err(TestError)` - Context not built or query failed
    pub async fn count(&self, table: &str, filter: Value) -> Result<u64, TestError> {
        let store = self.config()?.require_store()?;

        Ok(store.count(table, &to_filter(filter)).await?)
    }

    /// Asserts that `table` holds exactly `expected` rows.
    pub async fn assert_count(&self, table: &str, expected: u64) -> Result<(), TestError> {
        let actual = self.count(table, Value::Null).await?;

        assert_eq!(
            actual, expected,
            "expected {} row(s) in \"{}\", found {}",
            expected, table, actual
        );

        Ok(())
    }

    /// Asserts that exactly `expected` rows of `table` match `filter`.
    pub async fn assert_has(&self, table: &str, filter: Value, expected: u64) -> Result<(), TestError> {
        let description = filter.to_string();
        let actual = self.count(table, filter).await?;

        assert_eq!(
            actual, expected,
            "expected {} row(s) in \"{}\" matching {}, found {}",
            expected, table, description, actual
        );

        Ok(())
    }

    /// Asserts that at least one row of `table` matches `filter`.
    pub async fn assert_exists(&self, table: &str, filter: Value) -> Result<(), TestError> {
        let description = filter.to_string();
        let store = self.config()?.require_store()?;

        let exists = store.exists(table, &to_filter(filter)).await?;

        assert!(exists, "expected a row in \"{}\" matching {}", table, description);

        Ok(())
    }

    /// Asserts that no row of `table` matches `filter`.
    pub async fn assert_missing(&self, table: &str, filter: Value) -> Result<(), TestError> {
        self.assert_has(table, filter, 0).await
    }
}
