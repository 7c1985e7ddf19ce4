//! OKX REST dispatcher.
//!
//! [`OkxRestClient::invoke`] executes one [`Operation`]: it renders the
//! request (query string for GET, JSON body for POST), signs the exact bytes
//! it is about to send, and decodes the reply envelope into the operation's
//! result type. Calls are single-shot; nothing is retried.
//!
//! # Example
//!
//! ```rust,ignore
//! use okx_trade_sdk::prelude::*;
//!
//! let client = OkxRestClient::builder(DEFAULT_REST_URL)
//!     .credentials(Credentials::from_env()?)
//!     .build()?;
//!
//! let order = PlaceOrderRequest::new("BTC-USDT", TradeMode::Cash, OrderSide::Buy, OrderType::Limit, sz)
//!     .with_price(px);
//! let placed = client.place_order(&order).await?;
//! ```

use std::time::Duration;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::api::error::{ApiError, ApiResult};
use crate::auth::{rest_timestamp, Credentials};
use crate::network::{DEFAULT_REST_URL, SIMULATED_TRADING_HEADER};
use crate::shared::operation::{Endpoint, HttpMethod, Operation};
use crate::shared::reply::{decode_reply, ReplyEnvelope};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const HEADER_ACCESS_KEY: &str = "OK-ACCESS-KEY";
const HEADER_ACCESS_SIGN: &str = "OK-ACCESS-SIGN";
const HEADER_ACCESS_TIMESTAMP: &str = "OK-ACCESS-TIMESTAMP";
const HEADER_ACCESS_PASSPHRASE: &str = "OK-ACCESS-PASSPHRASE";

/// Builder for configuring [`OkxRestClient`].
#[derive(Debug, Clone)]
pub struct OkxRestClientBuilder {
    base_url: String,
    timeout: Duration,
    default_headers: Vec<(String, String)>,
    credentials: Option<Credentials>,
    demo_trading: bool,
}

impl Default for OkxRestClientBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_REST_URL)
    }
}

impl OkxRestClientBuilder {
    /// Create a new builder with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_headers: Vec::new(),
            credentials: None,
            demo_trading: false,
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Add a default header to all requests.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Set the API credentials used for signed endpoints.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Route requests to demo trading.
    pub fn demo_trading(mut self, enabled: bool) -> Self {
        self.demo_trading = enabled;
        self
    }

    /// Build the client.
    pub fn build(self) -> ApiResult<OkxRestClient> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if self.demo_trading {
            headers.insert(SIMULATED_TRADING_HEADER, HeaderValue::from_static("1"));
        }

        for (name, value) in self.default_headers {
            let header_name = HeaderName::try_from(name.as_str()).map_err(|e| {
                ApiError::InvalidParameter(format!("Invalid header name '{}': {}", name, e))
            })?;
            let header_value = HeaderValue::from_str(&value).map_err(|e| {
                ApiError::InvalidParameter(format!("Invalid header value for '{}': {}", name, e))
            })?;
            headers.insert(header_name, header_value);
        }

        let http_client = Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(10)
            .default_headers(headers)
            .build()?;

        Ok(OkxRestClient {
            http_client,
            base_url: self.base_url,
            credentials: self.credentials,
            demo_trading: self.demo_trading,
        })
    }
}

/// OKX REST client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct OkxRestClient {
    http_client: Client,
    base_url: String,
    credentials: Option<Credentials>,
    demo_trading: bool,
}

impl OkxRestClient {
    /// Create a client for `base_url` with default settings and no credentials.
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        OkxRestClientBuilder::new(base_url).build()
    }

    /// Create a new client builder for custom configuration.
    pub fn builder(base_url: impl Into<String>) -> OkxRestClientBuilder {
        OkxRestClientBuilder::new(base_url)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check whether credentials are set.
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Whether requests go to demo trading.
    pub fn is_demo_trading(&self) -> bool {
        self.demo_trading
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Execute an operation.
    pub async fn invoke<T: DeserializeOwned>(&self, op: &Operation<T>) -> ApiResult<T> {
        let (method, path) = match op.endpoint() {
            Endpoint::Rest { method, path } => (method, path),
            Endpoint::Socket { op: name } => {
                return Err(ApiError::InvalidParameter(format!(
                    "'{}' is a WebSocket operation",
                    name
                )))
            }
        };

        let request = op.request();
        let (request_path, body) = match method {
            HttpMethod::Get => {
                let query = request.to_query_string()?;
                if query.is_empty() {
                    (path.to_string(), String::new())
                } else {
                    (format!("{}?{}", path, query), String::new())
                }
            }
            HttpMethod::Post => (path.to_string(), request.to_json_body()?),
        };

        let url = format!("{}{}", self.base_url, request_path);
        let mut builder = match method {
            HttpMethod::Get => self.http_client.get(&url),
            HttpMethod::Post => self.http_client.post(&url).body(body.clone()),
        };

        if op.is_signed() {
            let credentials = self
                .credentials
                .as_ref()
                .ok_or(ApiError::MissingCredentials)?;
            let timestamp = rest_timestamp(Utc::now());
            let sign = credentials.sign(&timestamp, method.as_str(), &request_path, &body)?;
            builder = builder
                .header(HEADER_ACCESS_KEY, credentials.api_key())
                .header(HEADER_ACCESS_SIGN, sign)
                .header(HEADER_ACCESS_TIMESTAMP, timestamp)
                .header(HEADER_ACCESS_PASSPHRASE, credentials.passphrase());
        }

        tracing::debug!(
            endpoint = %op.endpoint(),
            signed = op.is_signed(),
            "Dispatching request"
        );

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Self::map_status_error(status, &text));
        }

        let envelope: ReplyEnvelope = serde_json::from_str(&text).map_err(|e| {
            ApiError::Deserialize(format!("Failed to deserialize response: {}", e))
        })?;

        if !envelope.is_success() {
            tracing::debug!(
                path = %path,
                code = %envelope.code,
                msg = %envelope.msg,
                "Exchange returned non-zero code"
            );
        }

        decode_reply(envelope, op.shape(), op.has_per_item_status()).map_err(ApiError::from)
    }

    /// Execute an operation, aborting when `cancel` fires.
    ///
    /// A cancelled request may still have reached the exchange.
    pub async fn invoke_with_cancel<T: DeserializeOwned>(
        &self,
        op: &Operation<T>,
        cancel: &CancellationToken,
    ) -> ApiResult<T> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            result = self.invoke(op) => result,
        }
    }

    /// Map a non-2xx reply to an ApiError.
    ///
    /// OKX often reports rejections with a 4xx status and a regular envelope;
    /// in that case the exchange code is preserved.
    fn map_status_error(status: StatusCode, body: &str) -> ApiError {
        if let Ok(envelope) = serde_json::from_str::<ReplyEnvelope>(body) {
            if !envelope.is_success() {
                return ApiError::Exchange {
                    code: envelope.code,
                    message: envelope.msg,
                };
            }
        }

        let message = if body.is_empty() {
            status.to_string()
        } else {
            body.to_string()
        };

        match status {
            StatusCode::BAD_REQUEST => ApiError::BadRequest(message),
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited(message),
            _ if status.is_server_error() => ApiError::ServerError(message),
            _ => ApiError::UnexpectedStatus(status.as_u16(), message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_trims_trailing_slash() {
        let client = OkxRestClient::new("https://www.okx.com/").unwrap();
        assert_eq!(client.base_url(), "https://www.okx.com");
        assert!(!client.has_credentials());
        assert!(!client.is_demo_trading());
    }

    #[test]
    fn test_builder_rejects_invalid_header() {
        let result = OkxRestClient::builder(DEFAULT_REST_URL)
            .header("bad header", "value")
            .build();
        assert!(matches!(result, Err(ApiError::InvalidParameter(_))));
    }

    #[test]
    fn test_map_status_error_prefers_envelope() {
        let err = OkxRestClient::map_status_error(
            StatusCode::UNAUTHORIZED,
            r#"{"code":"50113","msg":"Invalid Sign","data":[]}"#,
        );
        assert_eq!(err.exchange_code(), Some("50113"));
    }

    #[test]
    fn test_map_status_error_by_status() {
        assert!(matches!(
            OkxRestClient::map_status_error(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited(_)
        ));
        assert!(matches!(
            OkxRestClient::map_status_error(StatusCode::BAD_GATEWAY, "<html>"),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            OkxRestClient::map_status_error(StatusCode::NOT_FOUND, "nope"),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            OkxRestClient::map_status_error(StatusCode::IM_A_TEAPOT, "x"),
            ApiError::UnexpectedStatus(418, _)
        ));
    }

    #[tokio::test]
    async fn test_signed_without_credentials_fails_locally() {
        use crate::shared::wire::WireMap;

        let client = OkxRestClient::new("http://127.0.0.1:9").unwrap();
        let op: Operation<serde_json::Value> =
            Operation::get("/api/v5/trade/account-rate-limit", WireMap::new());
        let err = client.invoke(&op).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingCredentials));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        use crate::shared::wire::WireMap;

        let client = OkxRestClient::new("http://127.0.0.1:9").unwrap();
        let op: Operation<serde_json::Value> =
            Operation::get("/api/v5/public/time", WireMap::new()).unsigned();
        let token = CancellationToken::new();
        token.cancel();
        let err = client.invoke_with_cancel(&op, &token).await.unwrap_err();
        assert!(matches!(err, ApiError::Cancelled));
    }
}
