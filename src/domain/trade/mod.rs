//! Trading: order entry, order and fill queries, easy convert, one-click repay.
//!
//! Order entry is available over REST ([`OkxRestClient`](crate::api::OkxRestClient))
//! and over a private WebSocket session
//! ([`OkxWebSocketSession`](crate::websocket::OkxWebSocketSession)). Both
//! transports build the same operations from [`operations`].

pub mod operations;
pub mod requests;
pub mod responses;

#[cfg(feature = "http")]
mod rest;

#[cfg(feature = "ws-native")]
mod socket;

pub use requests::*;
pub use responses::*;

#[cfg(feature = "ws-native")]
pub use socket::ORDERS_CHANNEL;
