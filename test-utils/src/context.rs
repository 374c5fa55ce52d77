use factorify::{define_config, CasingConfig, ConfigOptions, Disposer, FactorioConfig};
use migration::{Migrator, MigratorTrait};
use sea_orm::{sea_query::TableCreateStatement, ConnectionTrait, Database, DatabaseConnection};

use crate::error::TestError;

/// Test context containing the database connection and the factory configuration.
///
/// Provides an in-memory SQLite database for isolated integration testing. Every
/// context owns its own database, so tests running in parallel never see each
/// other's rows.
#[derive(Default)]
pub struct TestContext {
    /// Optional database connection to in-memory SQLite instance.
    ///
    /// Initialized lazily when `database()` is first called.
    pub db: Option<DatabaseConnection>,

    /// Factory configuration persisting through `db`.
    ///
    /// Initialized by `define_factorio()`, normally from `TestBuilder::build()`.
    pub factorio: Option<FactorioConfig>,

    disposer: Option<Disposer>,
}

impl TestContext {
    /// Creates a new empty test context.
    ///
    /// # Returns
    /// - New `TestContext` instance with no database connection
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets or creates the in-memory SQLite database connection.
    ///
    /// # Returns
    /// - `Ok(&DatabaseConnection)` - Reference to the database connection
    /// - `Err(TestError::Database)` - Failed to connect to in-memory SQLite database
    pub async fn database(&mut self) -> Result<&DatabaseConnection, TestError> {
        match self.db {
            Some(ref db) => Ok(db),
            None => {
                let db = Database::connect("sqlite::memory:").await?;

                let db_ref = self.db.insert(db);

                Ok(&*db_ref)
            }
        }
    }

    /// Applies every migration of the `migration` crate.
    ///
    /// # Returns
    /// - `Ok(())` - Schema is up to date
    /// - `Err(TestError::Database)` - A migration failed
    pub async fn run_migrations(&mut self) -> Result<(), TestError> {
        let db = self.database().await?;

        Migrator::up(db, None).await?;

        Ok(())
    }

    /// Creates database tables from the provided CREATE TABLE statements.
    ///
    /// # Arguments
    /// - `stmts` - Vector of CREATE TABLE statements to execute
    ///
    /// # Returns
    /// - `Ok(())` - All tables created successfully
    /// - `Err(TestError::Database)` - Failed to create one or more tables
    pub async fn with_tables(&mut self, stmts: Vec<TableCreateStatement>) -> Result<(), TestError> {
        let db = self.database().await?;

        for stmt in stmts {
            db.execute(&stmt).await?;
        }

        Ok(())
    }

    /// Defines the factory configuration on this context's connection.
    ///
    /// # Arguments
    /// - `seed` - Fixed fake-data seed, `None` for a random one
    /// - `casing` - Insert and return casing
    ///
    /// # Returns
    /// - `Ok(&FactorioConfig)` - The configuration now stored on the context
    /// - `Err(TestError)` - Failed to connect or to build the configuration
    pub async fn define_factorio(
        &mut self,
        seed: Option<u64>,
        casing: CasingConfig,
    ) -> Result<&FactorioConfig, TestError> {
        let db = self.database().await?.clone();

        let mut options = ConfigOptions::new().connection(db).casing(casing);
        if let Some(seed) = seed {
            options = options.seed(seed);
        }

        let (config, disposer) = define_config(options).await?;
        self.disposer = Some(disposer);

        Ok(&*self.factorio.insert(config))
    }

    /// The factory configuration.
    ///
    /// # Returns
    /// - `Ok(&FactorioConfig)` - Configuration defined during `build()`
    /// - `Err(TestError::Uninitialized)` - The context was not built with `TestBuilder`
    pub fn config(&self) -> Result<&FactorioConfig, TestError> {
        self.factorio
            .as_ref()
            .ok_or(TestError::Uninitialized("factory configuration"))
    }

    /// The database connection, without creating one.
    pub fn db(&self) -> Result<&DatabaseConnection, TestError> {
        self.db.as_ref().ok_or(TestError::Uninitialized("database"))
    }

    /// Closes the database through the factory disposer.
    pub async fn dispose(self) -> Result<(), TestError> {
        if let Some(disposer) = self.disposer {
            disposer.dispose().await?;
        }

        Ok(())
    }
}
