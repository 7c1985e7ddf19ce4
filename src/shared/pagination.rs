//! Cursor pagination shared by every list operation.
//!
//! `after` and `before` are opaque tokens taken from a previous page (usually
//! an order or bill ID). They are forwarded exactly as supplied and never
//! interpreted here. Result ordering is endpoint-specific.

use crate::shared::error::{WireError, WireResult};
use crate::shared::wire::WireMap;

/// Smallest accepted page size.
pub const MIN_LIMIT: u32 = 1;

/// Largest accepted page size.
pub const MAX_LIMIT: u32 = 100;

/// Page size used when the caller does not set one.
pub const DEFAULT_LIMIT: u32 = 100;

/// Maximum number of items in one batch place/cancel/amend call.
pub const MAX_BATCH_SIZE: usize = 20;

/// Cursor triple accepted by list operations.
///
/// Supplying both `after` and `before` is allowed; which one the exchange
/// honours is up to the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationCursor {
    /// Return records older than this cursor
    pub after: Option<String>,
    /// Return records newer than this cursor
    pub before: Option<String>,
    /// Page size, defaults to 100
    pub limit: Option<i64>,
}

impl PaginationCursor {
    /// A cursor with no tokens and the default limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Page backwards from `cursor`.
    pub fn after(cursor: impl Into<String>) -> Self {
        Self::new().with_after(cursor)
    }

    /// Page forwards from `cursor`.
    pub fn before(cursor: impl Into<String>) -> Self {
        Self::new().with_before(cursor)
    }

    pub fn with_after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    pub fn with_before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The validated page size.
    pub fn effective_limit(&self) -> WireResult<u32> {
        match self.limit {
            None => Ok(DEFAULT_LIMIT),
            Some(limit) => validate_limit(limit),
        }
    }

    /// Append `after`, `before` and `limit` to `map`.
    pub fn write_to(&self, map: WireMap) -> WireResult<WireMap> {
        let limit = self.effective_limit()?;
        map.optional("after", self.after.as_ref())?
            .optional("before", self.before.as_ref())?
            .required("limit", &limit)
    }
}

/// Check a page size against the accepted range.
pub fn validate_limit(limit: i64) -> WireResult<u32> {
    if limit < MIN_LIMIT as i64 || limit > MAX_LIMIT as i64 {
        return Err(WireError::LimitOutOfRange {
            got: limit,
            max: MAX_LIMIT,
        });
    }
    Ok(limit as u32)
}

/// Check a batch length against the per-call cap.
pub fn check_batch(len: usize, max: usize) -> WireResult<()> {
    if len == 0 {
        return Err(WireError::EmptyBatch);
    }
    if len > max {
        return Err(WireError::BatchTooLarge { len, max });
    }
    Ok(())
}
