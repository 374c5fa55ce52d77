//! Factory configuration and its lifecycle.
//!
//! A `FactorioConfig` bundles the record store, the casing policy and the fake-data
//! generator. It is created once by `define_config`, passed by reference into every
//! production call and torn down through the returned `Disposer`. There is no
//! global instance, so independent configurations (one per test, one per worker)
//! never see each other's connection.

use std::sync::{Arc, Mutex, MutexGuard};

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde::{Deserialize, Serialize};

use crate::{
    casing::CasingStrategy,
    error::{config::ConfigError, FactoryError},
    faker::Faker,
    store::{RecordStore, SeaOrmStore},
};

const DEFAULT_LOCALE: &str = "en";

const ENV_DATABASE_URL: &str = "FACTORIFY_DATABASE_URL";
const ENV_LOCALE: &str = "FACTORIFY_LOCALE";
const ENV_SEED: &str = "FACTORIFY_SEED";
const ENV_CASING_INSERT: &str = "FACTORIFY_CASING_INSERT";
const ENV_CASING_RETURN: &str = "FACTORIFY_CASING_RETURN";

/// Casing applied at the two conversion points of a production call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasingConfig {
    /// Applied to rows right before they are handed to the record store.
    pub insert: CasingStrategy,
    /// Applied to the final hydrated models returned to the caller.
    #[serde(rename = "return")]
    pub return_: CasingStrategy,
}

impl Default for CasingConfig {
    fn default() -> Self {
        Self {
            insert: CasingStrategy::Snake,
            return_: CasingStrategy::Camel,
        }
    }
}

/// Options accepted by `define_config`.
///
/// # Example
///
/// ```rust,ignore
/// let (config, disposer) = define_config(
///     ConfigOptions::new()
///         .database_url("sqlite::memory:")
///         .seed(42),
/// )
/// .await?;
/// ```
#[derive(Default)]
pub struct ConfigOptions {
    database_url: Option<String>,
    connection: Option<DatabaseConnection>,
    store: Option<Arc<dyn RecordStore>>,
    locale: Option<String>,
    seed: Option<u64>,
    casing: CasingConfig,
}

impl ConfigOptions {
    /// Options without any record store; only `make` calls will succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads options from the environment, loading a `.env` file first if present.
    ///
    /// Recognised variables:
    /// - `FACTORIFY_DATABASE_URL` (required)
    /// - `FACTORIFY_LOCALE`
    /// - `FACTORIFY_SEED`
    /// - `FACTORIFY_CASING_INSERT` / `FACTORIFY_CASING_RETURN` (`camel`, `snake`, `none`)
    ///
    /// # Returns
    /// - `Ok(ConfigOptions)` - Options populated from the environment
    /// - `Err(ConfigError)` - Missing database URL or unparsable value
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var(ENV_DATABASE_URL)
            .map_err(|_| ConfigError::MissingEnvVar(ENV_DATABASE_URL.to_string()))?;

        let mut options = Self::new().database_url(database_url);

        if let Ok(locale) = std::env::var(ENV_LOCALE) {
            options = options.locale(locale);
        }

        if let Ok(seed) = std::env::var(ENV_SEED) {
            let seed = seed
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidEnvVar(ENV_SEED.to_string(), seed.clone()))?;
            options = options.seed(seed);
        }

        if let Ok(insert) = std::env::var(ENV_CASING_INSERT) {
            options.casing.insert = insert.parse()?;
        }

        if let Ok(return_) = std::env::var(ENV_CASING_RETURN) {
            options.casing.return_ = return_.parse()?;
        }

        Ok(options)
    }

    /// Connect to this database URL when the config is defined.
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Reuse an already open SeaORM connection.
    pub fn connection(mut self, db: DatabaseConnection) -> Self {
        self.connection = Some(db);
        self
    }

    /// Use a custom record store implementation.
    pub fn store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Fixes the fake-data seed for reproducible runs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn casing(mut self, casing: CasingConfig) -> Self {
        self.casing = casing;
        self
    }
}

struct ConfigInner {
    store: Option<Arc<dyn RecordStore>>,
    casing: CasingConfig,
    faker: Mutex<Faker>,
}

/// Active factory configuration; cloning is cheap and shares the same store.
#[derive(Clone)]
pub struct FactorioConfig {
    inner: Arc<ConfigInner>,
}

impl FactorioConfig {
    /// Builds a configuration without connecting anything.
    ///
    /// Used by `define_config` once the store is resolved, and directly by code
    /// that already owns a store.
    ///
    /// # Arguments
    /// - `store` - Record store used by `create` calls, `None` for stub-only use
    /// - `casing` - Insert and return casing
    /// - `faker` - Fake-data generator shared by every field provider
    pub fn new(store: Option<Arc<dyn RecordStore>>, casing: CasingConfig, faker: Faker) -> Self {
        Self {
            inner: Arc::new(ConfigInner {
                store,
                casing,
                faker: Mutex::new(faker),
            }),
        }
    }

    /// The record store, if one is configured.
    pub fn store(&self) -> Option<&Arc<dyn RecordStore>> {
        self.inner.store.as_ref()
    }

    /// The record store, or `MissingConnection`.
    pub fn require_store(&self) -> Result<&Arc<dyn RecordStore>, FactoryError> {
        self.store().ok_or(FactoryError::MissingConnection)
    }

    pub fn casing(&self) -> CasingConfig {
        self.inner.casing
    }

    /// Locks the fake-data generator.
    ///
    /// The guard must be dropped before awaiting.
    pub fn faker(&self) -> MutexGuard<'_, Faker> {
        // A provider that panicked mid-row leaves the generator usable.
        self.inner
            .faker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for FactorioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactorioConfig")
            .field("store", &self.inner.store.is_some())
            .field("casing", &self.inner.casing)
            .finish()
    }
}

/// Tears down the connection opened by `define_config`.
pub struct Disposer {
    store: Option<Arc<dyn RecordStore>>,
}

impl Disposer {
    /// Closes the record store.
    ///
    /// # Returns
    /// - `Ok(())` - Store closed, or there was nothing to close
    /// - `Err(FactoryError)` - The store failed to close
    pub async fn dispose(self) -> Result<(), FactoryError> {
        if let Some(store) = self.store {
            store.close().await?;
            tracing::debug!("Factory record store closed");
        }

        Ok(())
    }
}

/// Defines the factory configuration.
///
/// Resolves the record store (custom store, existing connection or a new connection
/// to `database_url`, in that order of preference), seeds the fake-data generator
/// and returns the configuration together with its disposer.
///
/// # Arguments
/// - `options` - Configuration options
///
/// # Returns
/// - `Ok((FactorioConfig, Disposer))` - Ready configuration and its teardown handle
/// - `Err(FactoryError::Config)` - Unsupported locale
/// - `Err(FactoryError::Db)` - Failed to connect to the database
pub async fn define_config(
    options: ConfigOptions,
) -> Result<(FactorioConfig, Disposer), FactoryError> {
    let locale = options.locale.as_deref().unwrap_or(DEFAULT_LOCALE);
    let faker = Faker::new(locale, options.seed)?;

    let store: Option<Arc<dyn RecordStore>> = match (options.store, options.connection) {
        (Some(store), _) => Some(store),
        (None, Some(db)) => Some(Arc::new(SeaOrmStore::new(db))),
        (None, None) => match options.database_url {
            Some(url) => {
                let mut opt = ConnectOptions::new(url);
                opt.sqlx_logging(false);

                let db = Database::connect(opt).await?;
                Some(Arc::new(SeaOrmStore::new(db)))
            }
            None => None,
        },
    };

    tracing::debug!(
        "Factory configuration defined (store: {}, locale: {}, casing: {:?})",
        store.is_some(),
        faker.locale(),
        options.casing
    );

    let config = FactorioConfig::new(store.clone(), options.casing, faker);

    Ok((config, Disposer { store }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn config_without_store_reports_missing_connection() {
        let (config, disposer) = define_config(ConfigOptions::new()).await.unwrap();

        assert!(config.store().is_none());
        assert!(matches!(
            config.require_store(),
            Err(FactoryError::MissingConnection)
        ));
        disposer.dispose().await.unwrap();
    }

    #[tokio::test]
    async fn connects_to_database_url() -> Result<(), FactoryError> {
        let (config, disposer) =
            define_config(ConfigOptions::new().database_url("sqlite::memory:")).await?;

        assert!(config.store().is_some());
        disposer.dispose().await?;

        Ok(())
    }

    #[tokio::test]
    async fn rejects_unsupported_locale() {
        let result = define_config(ConfigOptions::new().locale("tlh")).await;

        assert!(matches!(
            result,
            Err(FactoryError::Config(ConfigError::UnsupportedLocale(_)))
        ));
    }

    #[test]
    fn default_casing_is_snake_in_camel_out() {
        let casing = CasingConfig::default();

        assert_eq!(casing.insert, CasingStrategy::Snake);
        assert_eq!(casing.return_, CasingStrategy::Camel);
    }
}
