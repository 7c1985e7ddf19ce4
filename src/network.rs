//! Network URL constants for OKX.

/// REST API base URL. Demo trading uses the same host with the
/// `x-simulated-trading: 1` header.
pub const DEFAULT_REST_URL: &str = "https://www.okx.com";

/// Public WebSocket channels (market data, instruments).
pub const WS_PUBLIC_URL: &str = "wss://ws.okx.com:8443/ws/v5/public";

/// Private WebSocket channels and order entry.
pub const WS_PRIVATE_URL: &str = "wss://ws.okx.com:8443/ws/v5/private";

/// Business WebSocket channels (algo and grid orders, candles).
pub const WS_BUSINESS_URL: &str = "wss://ws.okx.com:8443/ws/v5/business";

/// Demo trading public WebSocket.
pub const DEMO_WS_PUBLIC_URL: &str = "wss://wspap.okx.com:8443/ws/v5/public";

/// Demo trading private WebSocket.
pub const DEMO_WS_PRIVATE_URL: &str = "wss://wspap.okx.com:8443/ws/v5/private";

/// Demo trading business WebSocket.
pub const DEMO_WS_BUSINESS_URL: &str = "wss://wspap.okx.com:8443/ws/v5/business";

/// Header that routes REST requests to demo trading.
pub const SIMULATED_TRADING_HEADER: &str = "x-simulated-trading";

/// Broker tag stamped on order-creating operations.
pub const BROKER_TAG: &str = "9cd07e5d1a3dBCDE";

/// WebSocket endpoint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsChannelKind {
    Public,
    Private,
    Business,
}

impl WsChannelKind {
    /// URL for this family, live or demo.
    pub fn url(&self, demo: bool) -> &'static str {
        match (self, demo) {
            (Self::Public, false) => WS_PUBLIC_URL,
            (Self::Private, false) => WS_PRIVATE_URL,
            (Self::Business, false) => WS_BUSINESS_URL,
            (Self::Public, true) => DEMO_WS_PUBLIC_URL,
            (Self::Private, true) => DEMO_WS_PRIVATE_URL,
            (Self::Business, true) => DEMO_WS_BUSINESS_URL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_urls() {
        assert_eq!(WsChannelKind::Private.url(false), WS_PRIVATE_URL);
        assert_eq!(WsChannelKind::Business.url(true), DEMO_WS_BUSINESS_URL);
        assert!(WsChannelKind::Public.url(true).contains("wspap"));
    }
}
