//! WebSocket-specific error types for the OKX session.

use thiserror::Error;

use crate::auth::AuthError;
use crate::shared::error::WireError;
use crate::shared::reply::ReplyError;

/// WebSocket-specific errors
#[derive(Debug, Clone, Error)]
pub enum WebSocketError {
    /// Initial connection failure
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Server closed the connection
    #[error("Connection closed unexpectedly: code {code}, reason: {reason}")]
    ConnectionClosed { code: u16, reason: String },

    /// The connection dropped while the call was in flight
    #[error("Connection lost before a reply arrived")]
    ConnectionLost,

    /// Rate limited (close code 1008)
    #[error("Rate limited: too many connections")]
    RateLimited,

    /// JSON deserialization failure
    #[error("Failed to parse message: {0}")]
    MessageParseError(String),

    /// Subscription rejected or unanswered
    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    /// No text `pong` within the configured window
    #[error("Pong timeout: no response to ping")]
    PongTimeout,

    /// WebSocket protocol error
    #[error("WebSocket protocol error: {0}")]
    Protocol(String),

    /// The exchange rejected the request
    #[error("Exchange error {code}: {message}")]
    Exchange { code: String, message: String },

    /// A request precondition failed before anything was sent
    #[error("Invalid request: {0}")]
    Wire(#[from] WireError),

    /// Not connected
    #[error("Not connected to WebSocket server")]
    NotConnected,

    /// Send failed
    #[error("Failed to send message: {0}")]
    SendFailed(String),

    /// Invalid URL
    #[error("Invalid WebSocket URL: {0}")]
    InvalidUrl(String),

    /// No reply within the request timeout
    #[error("Operation timed out")]
    Timeout,

    /// The caller cancelled the call
    #[error("Operation cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Login rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Signed operation on a session that has not logged in
    #[error("Authentication required for signed operations")]
    AuthRequired,
}

impl WebSocketError {
    /// The exchange error code, if the exchange rejected the request.
    pub fn exchange_code(&self) -> Option<&str> {
        match self {
            Self::Exchange { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for WebSocketError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error;
        match err {
            Error::ConnectionClosed => WebSocketError::ConnectionClosed {
                code: 1000,
                reason: "Connection closed normally".to_string(),
            },
            Error::AlreadyClosed => WebSocketError::NotConnected,
            Error::Io(e) => WebSocketError::Io(e.to_string()),
            Error::Protocol(e) => WebSocketError::Protocol(e.to_string()),
            Error::Url(e) => WebSocketError::InvalidUrl(e.to_string()),
            Error::Http(resp) => {
                WebSocketError::ConnectionFailed(format!("HTTP error: {:?}", resp.status()))
            }
            Error::HttpFormat(e) => WebSocketError::ConnectionFailed(e.to_string()),
            other => WebSocketError::Protocol(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for WebSocketError {
    fn from(err: serde_json::Error) -> Self {
        WebSocketError::MessageParseError(err.to_string())
    }
}

impl From<AuthError> for WebSocketError {
    fn from(err: AuthError) -> Self {
        WebSocketError::AuthenticationFailed(err.to_string())
    }
}

impl From<ReplyError> for WebSocketError {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::Exchange { code, message } => WebSocketError::Exchange { code, message },
            ReplyError::Decode(msg) => WebSocketError::MessageParseError(msg),
        }
    }
}

/// Result type alias for WebSocket operations
pub type WsResult<T> = Result<T, WebSocketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_error_conversion() {
        let err = WebSocketError::from(ReplyError::Exchange {
            code: "51008".to_string(),
            message: "Insufficient balance".to_string(),
        });
        assert_eq!(err.exchange_code(), Some("51008"));

        let err = WebSocketError::from(ReplyError::Decode("bad".to_string()));
        assert!(matches!(err, WebSocketError::MessageParseError(_)));
    }

    #[test]
    fn test_wire_error_conversion() {
        let err: WebSocketError = WireError::MissingField("instId").into();
        assert!(matches!(err, WebSocketError::Wire(WireError::MissingField("instId"))));
        assert_eq!(err.exchange_code(), None);
    }

    #[test]
    fn test_auth_error_conversion() {
        let err: WebSocketError = AuthError::InvalidSecret("empty".to_string()).into();
        assert!(matches!(err, WebSocketError::AuthenticationFailed(_)));
    }
}
