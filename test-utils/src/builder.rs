use factorify::CasingConfig;
use sea_orm::sea_query::TableCreateStatement;

use crate::{context::TestContext, error::TestError, logging::init_logging};

/// Builder for creating test contexts with customizable database schemas.
///
/// Provides a fluent interface for configuring test environments with in-memory SQLite
/// databases. Add the schema with `with_migrations()` and/or `with_table()`, then call
/// `build()` to create the context together with its factory configuration.
///
/// # Example
///
/// ```rust,ignore
/// use test_utils::builder::TestBuilder;
///
/// let test = TestBuilder::new()
///     .with_migrations()
///     .with_seed(42)
///     .build()
///     .await?;
/// ```
#[derive(Default)]
pub struct TestBuilder {
    /// Vector of CREATE TABLE statements to execute during database setup.
    ///
    /// Statements are executed in the order they were added, after migrations.
    tables: Vec<TableCreateStatement>,

    /// Whether the migration crate's schema is applied before the extra tables.
    migrations: bool,

    /// Fixed fake-data seed for the factory configuration.
    seed: Option<u64>,

    /// Casing policy of the factory configuration.
    casing: CasingConfig,
}

impl TestBuilder {
    /// Creates a new test builder with no tables configured.
    ///
    /// # Returns
    /// - New `TestBuilder` instance with empty table configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies every migration of the `migration` crate during `build()`.
    ///
    /// Creates the `user`, `admin`, `profile`, `post` and `account` tables used by
    /// `fixture::Factories`.
    ///
    /// # Returns
    /// - `Self` - Builder instance for method chaining
    pub fn with_migrations(mut self) -> Self {
        self.migrations = true;
        self
    }

    /// Adds a table to the test database schema.
    ///
    /// Tables should be added in dependency order (tables with foreign keys after
    /// their referenced tables).
    ///
    /// # Arguments
    /// - `stmt` - CREATE TABLE statement executed during `build()`
    ///
    /// # Returns
    /// - `Self` - Builder instance for method chaining
    pub fn with_table(mut self, stmt: TableCreateStatement) -> Self {
        self.tables.push(stmt);
        self
    }

    /// Seeds the fake-data generator so generated values are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_casing(mut self, casing: CasingConfig) -> Self {
        self.casing = casing;
        self
    }

    /// Builds and initializes the test context.
    ///
    /// Creates an in-memory SQLite database, runs migrations if requested, creates
    /// the extra tables and defines the factory configuration on the connection.
    ///
    /// # Returns
    /// - `Ok(TestContext)` - Fully initialized test context
    /// - `Err(TestError::Database)` - Failed to connect, migrate or create tables
    /// - `Err(TestError::Factory)` - Failed to define the factory configuration
    pub async fn build(self) -> Result<TestContext, TestError> {
        init_logging();

        let mut setup = TestContext::new();

        if self.migrations {
            setup.run_migrations().await?;
        }

        setup.with_tables(self.tables).await?;
        setup.define_factorio(self.seed, self.casing).await?;

        Ok(setup)
    }
}
