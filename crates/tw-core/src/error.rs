//! Error types for tw-core

use thiserror::Error;

/// Main error type for tw-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Logging setup error: {0}")]
    Logging(String),
}

/// Result type alias for tw-core
pub type Result<T> = std::result::Result<T, Error>;
