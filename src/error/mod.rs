//! Error types for factory definition and production.
//!
//! `FactoryError` is the single error type surfaced by every production call. It
//! separates configuration problems (no record store, bad environment), lookup
//! problems (unknown state or relationship names), caller type errors and
//! persistence failures coming back from the record store. Persistence errors are
//! never translated or retried: rows written before the failure stay committed.

pub mod config;

use thiserror::Error;

use crate::error::config::ConfigError;

/// Top-level factory error type.
#[derive(Error, Debug)]
pub enum FactoryError {
    /// Configuration error while building a `FactorioConfig`.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A persisting call (`create`, `create_many`) was made without a record store.
    ///
    /// Raised before any row is generated so nothing is written.
    #[error("You must set a connection to the database before using the factory")]
    MissingConnection,

    /// The applied state was never registered on the factory.
    ///
    /// # Fields
    /// - Name of the offending state
    #[error("The state \"{0}\" does not exist on the factory")]
    UnknownState(String),

    /// The requested relationship was never declared on the factory.
    ///
    /// # Fields
    /// - Name of the offending relationship
    #[error("The relationship \"{0}\" does not exist on the factory")]
    UnknownRelationship(String),

    /// A deferred factory reference no longer points at a live builder.
    ///
    /// # Fields
    /// - Name of the relationship whose factory could not be resolved
    #[error("The factory for relationship \"{0}\" could not be resolved")]
    UnresolvedFactory(String),

    /// A state was applied with an empty name.
    #[error("You must provide a state name to apply")]
    EmptyStateName,

    /// Override input was neither an object nor a sequence of objects.
    ///
    /// # Fields
    /// - JSON kind that was supplied (`string`, `number`, ...)
    #[error("Merge input must be an object or an array of objects, got {0}")]
    InvalidMergeInput(&'static str),

    /// Database error from SeaORM, propagated unchanged.
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),

    /// Error reported by a non-SeaORM record store implementation.
    #[error("{0}")]
    Store(String),
}
