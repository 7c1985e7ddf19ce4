//! Precondition errors raised while building wire requests.
//!
//! Everything in here is detected locally, before a request reaches the
//! network.

use thiserror::Error;

/// Local validation failure for an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// A required field was absent or empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The same wire key was written twice
    #[error("Duplicate wire key: {0}")]
    DuplicateKey(String),

    /// Pagination limit outside the accepted range
    #[error("Limit must be 1-{max}, got {got}")]
    LimitOutOfRange { got: i64, max: u32 },

    /// Batch larger than the exchange accepts per call
    #[error("Batch of {len} items exceeds the maximum of {max}")]
    BatchTooLarge { len: usize, max: usize },

    /// Batch with nothing in it
    #[error("Batch must contain at least one item")]
    EmptyBatch,

    /// An unrecognized enum token was fed back into a request
    #[error("Cannot encode unrecognized {kind} value '{raw}'")]
    UnencodableEnum { kind: &'static str, raw: String },

    /// A decimal string could not be parsed
    #[error("Invalid decimal: {0}")]
    InvalidDecimal(String),

    /// The payload cannot be rendered for the requested placement
    #[error("Unsupported placement: {0}")]
    Placement(String),
}

/// Result type alias for request construction.
pub type WireResult<T> = Result<T, WireError>;
