use factorify::FactoryError;
use sea_orm::DbErr;
use thiserror::Error;

/// Errors that can occur while setting up or running a test.
#[derive(Error, Debug)]
pub enum TestError {
    /// Failed to connect to the test database or run a statement on it.
    #[error(transparent)]
    Database(#[from] DbErr),

    /// A factory call or configuration failed.
    #[error(transparent)]
    Factory(#[from] FactoryError),

    /// The context was used before `TestBuilder::build` initialized it.
    #[error("Test context is missing its {0}, build it with TestBuilder")]
    Uninitialized(&'static str),
}
