//! Endpoint layers.
//!
//! Each area holds its request and response types plus one operation
//! constructor per exchange action. The transports attach thin methods on
//! top: REST wrappers on [`OkxRestClient`](crate::api::OkxRestClient) and
//! socket wrappers on [`OkxWebSocketSession`](crate::websocket::OkxWebSocketSession).

pub mod grid;
pub mod trade;
