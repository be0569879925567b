//! Client setup errors.

use thiserror::Error;

/// Errors raised while building a client; request failures are `StoreError`s.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
