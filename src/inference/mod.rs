//! Image generation inference API
//!
//! Provides the generation client and the bearer credential lifecycle
//! (rotation and periodic refresh) for the inference service.

/// HTTP client for the generation endpoint
pub mod client;
pub(crate) mod http_utils;
/// Token rotation endpoint client
pub mod rotation;
/// Shared bearer credential and its refresh driver
pub mod token;

pub use client::GenerationClient;
pub use rotation::HttpTokenRotator;
pub use token::{TokenManager, TokenRefresher};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors returned by the generation endpoint
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The endpoint answered with a non-200 status
    #[error("Ошибка {status}: {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body text, verbatim
        body: String,
    },
    /// The endpoint could not be reached or timed out
    #[error("Network error: {0}")]
    Network(String),
}

/// Errors returned while rotating the bearer token
#[derive(Debug, Error)]
pub enum TokenRotationError {
    /// The rotation endpoint answered with a non-200 status
    #[error("Rotation endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },
    /// The response body was not the expected JSON
    #[error("Malformed rotation response: {0}")]
    Malformed(String),
    /// The response JSON had no usable `token` field
    #[error("Rotation response has no token")]
    MissingToken,
    /// The rotation endpoint could not be reached or timed out
    #[error("Network error: {0}")]
    Network(String),
}

/// Produces an image from a text prompt
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an image; returns the raw encoded bytes on HTTP 200
    async fn generate(&self, prompt: &str) -> Result<Bytes, GenerationError>;
}

/// Exchanges a session credential for a fresh bearer token
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRotator: Send + Sync {
    /// Request a new token
    async fn rotate(&self) -> Result<String, TokenRotationError>;
}
