//! Error types for the storefront client.

use thiserror::Error;

use crate::storage::StorageError;
use crate::store::cart::CartError;
use crate::validation::ValidationErrors;

/// Client error type.
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// The local session could not be recovered; the user must sign in again.
    #[error("Session expired, please sign in again")]
    SessionExpired,

    /// Persistent client storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The access token could not be decoded.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Local form validation rejected the input before it was sent.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// The OAuth2 callback carried an error or incomplete tokens.
    #[error("OAuth2 error: {0}")]
    OAuth(String),

    /// Cart mutation rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,
}

impl ApiError {
    /// HTTP status of an API error, if this is one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the caller has to send the user back through sign-in.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::InvalidToken(_))
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;
