use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is not set.
    ///
    /// `ConfigOptions::from_env` requires the database URL variable to be defined.
    /// Check the crate documentation for the list of recognised variables.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable is set but its value cannot be parsed.
    ///
    /// # Fields
    /// - Name of the variable
    /// - Raw value that failed to parse
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidEnvVar(String, String),

    /// The requested faker locale has no word lists.
    #[error("Unsupported faker locale: {0}")]
    UnsupportedLocale(String),

    /// Casing strategy name is not one of `camel`, `snake` or `none`.
    #[error("Unknown casing strategy: {0}")]
    InvalidCasing(String),
}
