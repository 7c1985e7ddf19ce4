//! WebSocket session module for OKX.
//!
//! A session carries correlated queries (order entry over `order`,
//! `batch-orders`, ...) and channel subscriptions over one socket.
//!
//! ```rust,ignore
//! use okx_trade_sdk::websocket::{ChannelArg, OkxWebSocketSession};
//!
//! let session = OkxWebSocketSession::connect_private(credentials).await?;
//! let handle = session
//!     .subscribe(ChannelArg::new("orders").with_inst_type("ANY"), |frame| {
//!         println!("{} order updates", frame.data.len());
//!     })
//!     .await?;
//! session.unsubscribe(&handle).await?;
//! ```

pub mod client;
pub mod error;
pub mod subscriptions;
pub mod types;

pub use client::{ConnectionState, OkxWebSocketSession, WebSocketConfig};
pub use error::{WebSocketError, WsResult};
pub use subscriptions::{PushHandler, SubscriptionHandle, SubscriptionMultiplexer, SubscriptionStream};
pub use types::{ChannelArg, ChannelKey, PushFrame, SessionEvent};
