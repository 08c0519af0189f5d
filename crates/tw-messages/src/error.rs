//! Error types for tw-messages

use thiserror::Error;

use crate::types::ApiException;

/// Structured rejection returned by the API for a non-success status
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status that carried the error body
    pub status: u16,
    /// Decoded error body. Fields stay at their defaults when the body was malformed.
    pub exception: ApiException,
    /// Why the error body could not be decoded, if it could not
    pub decode_error: Option<String>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if self.exception.code != 0 {
            write!(f, " (code {})", self.exception.code)?;
        }
        if !self.exception.message.is_empty() {
            write!(f, ": {}", self.exception.message)?;
        }
        if let Some(ref e) = self.decode_error {
            write!(f, " [undecodable error body: {}]", e)?;
        }
        Ok(())
    }
}

/// tw-messages error type
///
/// `Api` is the service saying no. Every other variant means the service
/// could not be reached or understood.
#[derive(Error, Debug)]
pub enum Error {
    #[error("API error: {0}")]
    Api(ApiError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Pagination error: {0}")]
    Pagination(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error(transparent)]
    Config(#[from] tw_core::Error),
}

impl Error {
    /// The structured API error, if this is one
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(api) => Some(api),
            _ => None,
        }
    }

    /// Whether the service rejected the request (as opposed to being unreachable)
    pub fn is_api(&self) -> bool {
        matches!(self, Error::Api(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
