//! # OKX Trade Rust SDK
//!
//! A Rust SDK for the OKX v5 trading API.
//!
//! ## Modules
//!
//! - [`api`]: REST dispatcher that signs, sends and decodes operations
//! - [`websocket`]: WebSocket session with correlated queries and
//!   multiplexed channel subscriptions
//! - [`domain`]: trade and grid endpoint layers on top of both transports
//!
//! Plus the shared pieces:
//! - [`shared`]: wire parameter codec, enum tables, pagination, reply decoding
//! - [`auth`]: credentials and request signing
//! - [`network`]: endpoint URLs and the broker tag
//!
//! ## Quick Start - REST API
//!
//! ```rust,ignore
//! use okx_trade_sdk::prelude::*;
//! use rust_decimal::Decimal;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OkxRestClient::builder(DEFAULT_REST_URL)
//!         .credentials(Credentials::from_env()?)
//!         .build()?;
//!
//!     let ack = client
//!         .place_order(
//!             &PlaceOrderRequest::new(
//!                 "BTC-USDT",
//!                 TradeMode::Cash,
//!                 OrderSide::Buy,
//!                 OrderType::Limit,
//!                 Decimal::new(1, 2),
//!             )
//!             .with_price(Decimal::new(60000, 0)),
//!         )
//!         .await?;
//!     println!("placed {}", ack.ord_id);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Quick Start - WebSocket
//!
//! ```rust,ignore
//! use okx_trade_sdk::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = OkxWebSocketSession::connect_private(Credentials::from_env()?).await?;
//!
//!     let handle = session
//!         .subscribe_orders(InstrumentType::Any, None, None, |order| {
//!             println!("{} is {:?}", order.ord_id, order.state);
//!         })
//!         .await?;
//!
//!     session.unsubscribe(&handle).await?;
//!     session.disconnect().await?;
//!     Ok(())
//! }
//! ```

// ============================================================================
// MODULES
// ============================================================================

/// Wire codec, enum tables, pagination and reply decoding.
/// Used by both transports.
pub mod shared;

/// Network URL constants (REST and WebSocket endpoints).
pub mod network;

/// Credentials and HMAC-SHA256 request signing.
pub mod auth;

/// Trade and grid endpoint layers.
pub mod domain;

/// REST dispatcher.
#[cfg(feature = "http")]
pub mod api;

/// WebSocket session with subscription multiplexing.
#[cfg(feature = "ws-native")]
pub mod websocket;

// ============================================================================
// PRELUDE
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use okx_trade_sdk::prelude::*;
/// ```
pub mod prelude {
    // Shared codec and enums
    pub use crate::shared::{
        format_decimal, parse_decimal, ItemStatus, PaginationCursor, ReplyEnvelope, ToWireMap,
        Wire, WireEnum, WireError, WireMap, WireResult,
        // Enums
        AlgoPriceType, GridAlgoOrderType, GridAlgoState, GridBacktestDuration,
        GridContractDirection, GridContractStopType, GridRunType, GridSpotStopType,
        GridSubOrderType, GridTriggerAction, GridTriggerCondition, GridTriggerStrategy,
        InstrumentType, MarginAddReduce, MarginMode, OrderSide, OrderState, OrderType,
        PositionSide, QuantityType, SelfTradePreventionMode, Timeframe, TradeMode,
    };

    // Endpoint layers
    pub use crate::domain::grid::{
        AmendGridOrderRequest, CloseGridPositionRequest, GridAiParameterQuery, GridAlgoOrder,
        GridMarginRequest, GridMinInvestmentRequest, GridOrderAck, GridOrderRef,
        GridOrdersQuery, GridStopType, GridSubOrdersQuery, GridTriggerParams,
        PlaceGridOrderRequest, RsiBacktestQuery, StopGridOrderRequest,
    };
    pub use crate::domain::trade::{
        AmendOrderRequest, ClosePositionRequest, Fill, FillsQuery, OpenOrdersQuery, Order,
        OrderAck, OrderHistoryQuery, OrderRef, PlaceOrderRequest,
    };

    // Network constants
    pub use crate::network::{BROKER_TAG, DEFAULT_REST_URL, WS_PRIVATE_URL, WS_PUBLIC_URL, WsChannelKind};

    // Auth
    pub use crate::auth::{AuthError, AuthResult, Credentials};

    // REST dispatcher
    #[cfg(feature = "http")]
    pub use crate::api::{ApiError, ApiResult, OkxRestClient, OkxRestClientBuilder};

    // WebSocket session
    #[cfg(feature = "ws-native")]
    pub use crate::websocket::{
        ChannelArg, ConnectionState, OkxWebSocketSession, PushFrame, SessionEvent,
        SubscriptionHandle, WebSocketConfig, WebSocketError, WsResult,
    };
}
