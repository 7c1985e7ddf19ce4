//! API error types for the OKX REST dispatcher.

use thiserror::Error;

use crate::auth::AuthError;
use crate::shared::error::WireError;
use crate::shared::reply::ReplyError;

/// API-specific error type for the OKX REST dispatcher.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A request precondition failed before anything was sent
    #[error("Invalid request: {0}")]
    Wire(#[from] WireError),

    /// Request signing failed
    #[error("Signing error: {0}")]
    Auth(#[from] AuthError),

    /// A signed endpoint was called on a client without credentials
    #[error("Credentials are required for signed endpoints")]
    MissingCredentials,

    /// HTTP/network error from reqwest
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid request parameters (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authentication rejected (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited (429)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Server-side error (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Unexpected HTTP status code
    #[error("Unexpected status {0}: {1}")]
    UnexpectedStatus(u16, String),

    /// The exchange rejected the request
    #[error("Exchange error {code}: {message}")]
    Exchange { code: String, message: String },

    /// JSON deserialization error
    #[error("Deserialization error: {0}")]
    Deserialize(String),

    /// Invalid client configuration
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    /// The exchange error code, if the exchange rejected the request.
    pub fn exchange_code(&self) -> Option<&str> {
        match self {
            Self::Exchange { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<ReplyError> for ApiError {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::Exchange { code, message } => Self::Exchange { code, message },
            ReplyError::Decode(msg) => Self::Deserialize(msg),
        }
    }
}

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
