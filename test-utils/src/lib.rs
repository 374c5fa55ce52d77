//! Factorify Test Utils
//!
//! Shared utilities for the factory integration tests. This crate offers a builder
//! for test contexts backed by in-memory SQLite databases, a factory configuration
//! bound to that database, row assertions and a ready-made set of factories.
//!
//! # Overview
//!
//! The test utilities consist of these components:
//! - **TestBuilder**: Fluent builder for configuring test environments
//! - **TestContext**: Test environment holding the database and factory configuration
//! - **TestError**: Error types that can occur during test setup
//! - **Factories**: User, profile, post, account and admin factories wired together
//!
//! # Usage
//!
//! ```rust,ignore
//! use test_utils::{builder::TestBuilder, fixture::Factories};
//!
//! #[tokio::test]
//! async fn creates_user_with_posts() -> Result<(), TestError> {
//!     let test = TestBuilder::new().with_migrations().build().await?;
//!     let factories = Factories::new();
//!
//!     let user = factories.user.with("posts", 2)?.create(test.config()?).await?;
//!
//!     test.assert_has("post", json!({ "user_id": user["id"] }), 2).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod context;
pub mod database;
pub mod error;
pub mod fixture;
pub mod logging;
