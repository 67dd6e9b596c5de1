//! Error taxonomy for the generation engine
//!
//! Value models and classifiers are total and never fail; everything that
//! touches storage or configuration returns `Result<T, EngineError>`.

use thiserror::Error;

/// Result type used across the persistence-facing modules
pub type Result<T> = std::result::Result<T, EngineError>;

/// Startup configuration failures (fatal before any generation begins)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Invalid table identifier: {0:?}")]
    InvalidIdentifier(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Statement, transaction or connection failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
