//! Operation descriptors.
//!
//! An [`Operation`] is everything a transport needs to execute one exchange
//! action: where it goes, whether it is signed, how the reply's `data` array
//! maps onto the result type `T`, and the encoded parameters. Endpoint
//! wrappers build one per call and hand it to the REST dispatcher or the
//! WebSocket session.

use std::fmt;
use std::marker::PhantomData;

use crate::network::BROKER_TAG;
use crate::shared::error::WireResult;
use crate::shared::pagination::{check_batch, MAX_BATCH_SIZE};
use crate::shared::wire::{Placement, WireMap, WireRequest};

/// HTTP method of a REST endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport target of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// REST endpoint: method and path starting with `/api/v5/`
    Rest {
        method: HttpMethod,
        path: &'static str,
    },
    /// WebSocket operation tag (`order`, `cancel-order`, ...)
    Socket { op: &'static str },
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rest { method, path } => write!(f, "{} {}", method, path),
            Self::Socket { op } => write!(f, "ws:{}", op),
        }
    }
}

/// How the reply's `data` array maps onto the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// First element of `data`
    One,
    /// The whole `data` array
    List,
}

/// A fully-encoded exchange action producing `T`.
#[derive(Debug, Clone)]
pub struct Operation<T> {
    endpoint: Endpoint,
    signed: bool,
    shape: ResponseShape,
    per_item_status: bool,
    request: WireRequest,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Operation<T> {
    fn new(endpoint: Endpoint, request: WireRequest) -> Self {
        Self {
            endpoint,
            signed: true,
            shape: ResponseShape::One,
            per_item_status: false,
            request,
            _marker: PhantomData,
        }
    }

    /// Signed REST GET with parameters in the query string.
    pub fn get(path: &'static str, params: WireMap) -> Self {
        Self::new(
            Endpoint::Rest {
                method: HttpMethod::Get,
                path,
            },
            WireRequest::single(params, Placement::Query),
        )
    }

    /// Signed REST POST with a JSON object body.
    pub fn post(path: &'static str, params: WireMap) -> Self {
        Self::new(
            Endpoint::Rest {
                method: HttpMethod::Post,
                path,
            },
            WireRequest::single(params, Placement::Body),
        )
    }

    /// Signed REST POST with a JSON array body, one status per item.
    ///
    /// Rejects empty batches and batches over 20 items.
    pub fn post_batch(path: &'static str, items: Vec<WireMap>) -> WireResult<Self> {
        check_batch(items.len(), MAX_BATCH_SIZE)?;
        let mut op = Self::new(
            Endpoint::Rest {
                method: HttpMethod::Post,
                path,
            },
            WireRequest::batch(items, Placement::Body),
        );
        op.shape = ResponseShape::List;
        op.per_item_status = true;
        Ok(op)
    }

    /// Signed WebSocket operation with a single argument.
    pub fn socket(op: &'static str, params: WireMap) -> Self {
        Self::new(
            Endpoint::Socket { op },
            WireRequest::single(params, Placement::Envelope),
        )
    }

    /// Signed WebSocket operation with a batch of arguments, one status per item.
    pub fn socket_batch(op: &'static str, items: Vec<WireMap>) -> WireResult<Self> {
        check_batch(items.len(), MAX_BATCH_SIZE)?;
        let mut operation = Self::new(
            Endpoint::Socket { op },
            WireRequest::batch(items, Placement::Envelope),
        );
        operation.shape = ResponseShape::List;
        operation.per_item_status = true;
        Ok(operation)
    }

    /// Expect the whole `data` array as the result.
    pub fn list(mut self) -> Self {
        self.shape = ResponseShape::List;
        self
    }

    /// Public endpoint: no authentication headers.
    pub fn unsigned(mut self) -> Self {
        self.signed = false;
        self
    }

    /// Stamp the broker tag on every object of the payload.
    pub(crate) fn tagged(mut self) -> Self {
        self.request.stamp_tag(BROKER_TAG);
        self
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn shape(&self) -> ResponseShape {
        self.shape
    }

    /// Whether a non-zero envelope code may still carry per-item results.
    pub fn has_per_item_status(&self) -> bool {
        self.per_item_status
    }

    pub fn request(&self) -> &WireRequest {
        &self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::WireError;

    fn item(inst: &str) -> WireMap {
        WireMap::new().required("instId", inst).unwrap()
    }

    #[test]
    fn test_get_defaults() {
        let op: Operation<()> = Operation::get("/api/v5/trade/order", item("BTC-USDT"));
        assert!(op.is_signed());
        assert_eq!(op.shape(), ResponseShape::One);
        assert!(!op.has_per_item_status());
        assert_eq!(op.request().placement(), Placement::Query);
        assert_eq!(op.endpoint().to_string(), "GET /api/v5/trade/order");
    }

    #[test]
    fn test_batch_limits() {
        let twenty: Vec<WireMap> = (0..20).map(|_| item("BTC-USDT")).collect();
        let op = Operation::<()>::post_batch("/api/v5/trade/batch-orders", twenty).unwrap();
        assert_eq!(op.shape(), ResponseShape::List);
        assert!(op.has_per_item_status());

        let twenty_one: Vec<WireMap> = (0..21).map(|_| item("BTC-USDT")).collect();
        let err = Operation::<()>::post_batch("/api/v5/trade/batch-orders", twenty_one).unwrap_err();
        assert_eq!(err, WireError::BatchTooLarge { len: 21, max: 20 });

        let err = Operation::<()>::socket_batch("batch-orders", Vec::new()).unwrap_err();
        assert_eq!(err, WireError::EmptyBatch);
    }

    #[test]
    fn test_tagged_stamps_every_item() {
        let op = Operation::<()>::socket_batch("batch-orders", vec![item("A"), item("B")])
            .unwrap()
            .tagged();
        for map in op.request().envelope_args() {
            assert_eq!(map.get_str("tag"), Some(BROKER_TAG));
        }
    }

    #[test]
    fn test_unsigned_list() {
        let op = Operation::<Vec<()>>::get("/api/v5/tradingBot/grid/ai-param", WireMap::new())
            .unsigned()
            .list();
        assert!(!op.is_signed());
        assert_eq!(op.shape(), ResponseShape::List);
    }
}
