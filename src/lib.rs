//! Factorify
//!
//! Declarative test-data factories backed by a SQL database. A factory describes
//! how to generate one entity type; a production call generates rows, applies
//! overrides and named states, resolves has-one, has-many and belongs-to
//! relationships, persists (or stubs) the rows and hands back the hydrated graph.
//!
//! # Overview
//!
//! - **define_config**: Connects the record store and seeds the fake-data generator
//! - **define_factory**: Starts a factory definition (`FactoryModel`)
//! - **Builder**: Shared production session returned by `FactoryModel::build`
//! - **RecordStore**: Persistence contract, implemented for SeaORM by `SeaOrmStore`
//!
//! # Usage
//!
//! ```rust,ignore
//! use factorify::{define_config, define_factory, ConfigOptions, Fields};
//!
//! let (config, disposer) = define_config(
//!     ConfigOptions::new().database_url("sqlite::memory:"),
//! )
//! .await?;
//!
//! let posts = define_factory("post", |ctx| {
//!     Fields::new().field("title", ctx.faker.sentence())
//! })
//! .build();
//!
//! let users = define_factory("user", |ctx| {
//!     Fields::new()
//!         .field("email", ctx.faker.email())
//!         .field("password", ctx.faker.alphanumeric(12))
//! })
//! .has_many("posts", &posts)
//! .build();
//!
//! let user = users.with("posts", 3)?.create(&config).await?;
//! assert_eq!(user["posts"].as_array().map(Vec::len), Some(3));
//!
//! disposer.dispose().await?;
//! ```

pub mod builder;
pub mod casing;
pub mod config;
pub mod error;
pub mod faker;
pub mod field;
pub mod model;
pub mod store;

pub use builder::Builder;
pub use casing::{convert_case, CasingStrategy};
pub use config::{define_config, CasingConfig, ConfigOptions, Disposer, FactorioConfig};
pub use error::{config::ConfigError, FactoryError};
pub use faker::Faker;
pub use field::{FieldValue, Fields, MergeInput, Row};
pub use model::{
    define_factory,
    relation::{FactoryRef, FactorySlot, Relation, RelationType},
    FactoryContext, FactoryModel,
};
pub use store::{RecordStore, SeaOrmStore};
