//! Shared codec and types used by the REST dispatcher and the WebSocket session.

pub mod decimal;
pub mod enums;
pub mod error;
pub mod operation;
pub mod pagination;
pub mod reply;
pub mod wire;

// Re-export commonly used items
pub use decimal::{format_decimal, parse_decimal};
pub use enums::*;
pub use error::{WireError, WireResult};
pub use operation::{Endpoint, HttpMethod, Operation, ResponseShape};
pub use pagination::{PaginationCursor, DEFAULT_LIMIT, MAX_BATCH_SIZE, MAX_LIMIT, MIN_LIMIT};
pub use reply::{decode_reply, ItemStatus, ReplyEnvelope, ReplyError};
pub use wire::{Placement, ToWire, ToWireMap, WireMap, WirePayload, WireRequest, WireValue};
