//! Wire parameter codec.
//!
//! Typed requests render themselves into a [`WireMap`]: an ordered mapping of
//! wire keys to [`WireValue`]s. The builder methods enforce the two rules every
//! endpoint relies on:
//!
//! - required fields are always written, and an absent or empty required value
//!   is a [`WireError::MissingField`] at build time;
//! - optional fields are written only when present. `Some(false)`, `Some(0)` and
//!   `Some("")` are present values and are written.
//!
//! A key can appear at most once.

use rust_decimal::Decimal;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::shared::decimal::format_decimal;
use crate::shared::enums::{Wire, WireEnum};
use crate::shared::error::{WireError, WireResult};

/// Wire key carrying the broker tag on order-creating operations.
pub const TAG_KEY: &str = "tag";

/// A wire-safe value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    Str(String),
    Bool(bool),
    List(Vec<WireValue>),
    Map(WireMap),
}

impl WireValue {
    /// Render as a query-string value. Only scalars are allowed in a query.
    fn as_query_value(&self, key: &str) -> WireResult<String> {
        match self {
            Self::Str(s) => Ok(s.clone()),
            Self::Bool(b) => Ok(b.to_string()),
            Self::List(_) | Self::Map(_) => Err(WireError::Placement(format!(
                "nested value for '{}' cannot be sent as a query parameter",
                key
            ))),
        }
    }
}

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Str(s) => serializer.serialize_str(s),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(map) => map.serialize(serializer),
        }
    }
}

/// Conversion of a typed field into a [`WireValue`].
pub trait ToWire {
    fn to_wire(&self) -> WireResult<WireValue>;
}

impl ToWire for str {
    fn to_wire(&self) -> WireResult<WireValue> {
        Ok(WireValue::Str(self.to_string()))
    }
}

impl ToWire for String {
    fn to_wire(&self) -> WireResult<WireValue> {
        Ok(WireValue::Str(self.clone()))
    }
}

impl ToWire for bool {
    fn to_wire(&self) -> WireResult<WireValue> {
        Ok(WireValue::Bool(*self))
    }
}

impl ToWire for Decimal {
    fn to_wire(&self) -> WireResult<WireValue> {
        Ok(WireValue::Str(format_decimal(self)))
    }
}

macro_rules! integer_to_wire {
    ($($t:ty),+) => {
        $(
            impl ToWire for $t {
                fn to_wire(&self) -> WireResult<WireValue> {
                    Ok(WireValue::Str(self.to_string()))
                }
            }
        )+
    };
}

integer_to_wire!(u8, u16, u32, u64, i32, i64);

impl<T: WireEnum> ToWire for Wire<T> {
    fn to_wire(&self) -> WireResult<WireValue> {
        self.encode().map(|token| WireValue::Str(token.to_string()))
    }
}

impl<T: ToWire> ToWire for [T] {
    fn to_wire(&self) -> WireResult<WireValue> {
        self.iter()
            .map(ToWire::to_wire)
            .collect::<WireResult<Vec<_>>>()
            .map(WireValue::List)
    }
}

impl<T: ToWire> ToWire for Vec<T> {
    fn to_wire(&self) -> WireResult<WireValue> {
        self.as_slice().to_wire()
    }
}

impl ToWire for WireMap {
    fn to_wire(&self) -> WireResult<WireValue> {
        Ok(WireValue::Map(self.clone()))
    }
}

impl<T: ToWire + ?Sized> ToWire for &T {
    fn to_wire(&self) -> WireResult<WireValue> {
        (**self).to_wire()
    }
}

/// Enums declared with `wire_enum!` encode through their token table.
#[doc(hidden)]
pub struct Token<T>(pub T);

impl<T: WireEnum> ToWire for Token<T> {
    fn to_wire(&self) -> WireResult<WireValue> {
        Ok(WireValue::Str(self.0.as_wire().to_string()))
    }
}

/// Sub-objects that render through the same codec.
pub trait ToWireMap {
    fn to_wire_map(&self) -> WireResult<WireMap>;
}

/// Ordered mapping of wire keys to values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireMap {
    entries: Vec<(String, WireValue)>,
}

impl WireMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, key: &str, value: WireValue) -> WireResult<()> {
        if self.contains_key(key) {
            return Err(WireError::DuplicateKey(key.to_string()));
        }
        self.entries.push((key.to_string(), value));
        Ok(())
    }

    /// Write a required field.
    ///
    /// Empty strings count as missing: no required identifier on this API is
    /// allowed to be blank.
    pub fn required<V: ToWire + ?Sized>(mut self, key: &'static str, value: &V) -> WireResult<Self> {
        let value = value.to_wire()?;
        if matches!(&value, WireValue::Str(s) if s.is_empty()) {
            return Err(WireError::MissingField(key));
        }
        self.insert(key, value)?;
        Ok(self)
    }

    /// Write a required field that the caller holds as an `Option`.
    pub fn required_opt<V: ToWire>(self, key: &'static str, value: Option<&V>) -> WireResult<Self> {
        match value {
            Some(v) => self.required(key, v),
            None => Err(WireError::MissingField(key)),
        }
    }

    /// Write a required enum field.
    pub fn required_enum<T: WireEnum>(self, key: &'static str, value: T) -> WireResult<Self> {
        self.required(key, &Token(value))
    }

    /// Write an optional field if present.
    pub fn optional<V: ToWire>(mut self, key: &'static str, value: Option<&V>) -> WireResult<Self> {
        if let Some(v) = value {
            let value = v.to_wire()?;
            self.insert(key, value)?;
        }
        Ok(self)
    }

    /// Write an optional enum field if present.
    pub fn optional_enum<T: WireEnum>(self, key: &'static str, value: Option<T>) -> WireResult<Self> {
        self.optional(key, value.map(Token).as_ref())
    }

    /// Write an optional nested object if present.
    pub fn optional_map<M: ToWireMap>(mut self, key: &'static str, value: Option<&M>) -> WireResult<Self> {
        if let Some(m) = value {
            let map = m.to_wire_map()?;
            self.insert(key, WireValue::Map(map))?;
        }
        Ok(self)
    }

    /// Write an optional sequence of nested objects if present.
    pub fn optional_maps<M: ToWireMap>(mut self, key: &'static str, value: Option<&[M]>) -> WireResult<Self> {
        if let Some(items) = value {
            let list = items
                .iter()
                .map(|m| m.to_wire_map().map(WireValue::Map))
                .collect::<WireResult<Vec<_>>>()?;
            self.insert(key, WireValue::List(list))?;
        }
        Ok(self)
    }

    /// Require that at least one of `keys` has been written.
    pub fn require_any(self, keys: &[&'static str], label: &'static str) -> WireResult<Self> {
        if keys.iter().any(|k| self.contains_key(k)) {
            Ok(self)
        } else {
            Err(WireError::MissingField(label))
        }
    }

    /// Stamp the broker tag. Any tag already present is replaced.
    pub(crate) fn stamp_tag(&mut self, tag: &str) {
        self.entries.retain(|(k, _)| k != TAG_KEY);
        self.entries
            .insert(0, (TAG_KEY.to_string(), WireValue::Str(tag.to_string())));
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&WireValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a string value by key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(WireValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Whether `key` has been written.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as a url-encoded query string (no leading `?`).
    pub fn to_query_string(&self) -> WireResult<String> {
        let pairs = self
            .entries
            .iter()
            .map(|(k, v)| v.as_query_value(k).map(|value| (k.as_str(), value)))
            .collect::<WireResult<Vec<_>>>()?;
        serde_urlencoded::to_string(pairs).map_err(|e| WireError::Placement(e.to_string()))
    }
}

impl Serialize for WireMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Where a [`WireRequest`] goes on the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// JSON request body (REST POST)
    Body,
    /// Query string (REST GET)
    Query,
    /// `args` array of a WebSocket envelope
    Envelope,
}

/// Parameters of a request: one object, or a batch of objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WirePayload {
    Single(WireMap),
    Batch(Vec<WireMap>),
}

/// Codec output: the payload plus its placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRequest {
    payload: WirePayload,
    placement: Placement,
}

impl WireRequest {
    /// A single-object request.
    pub fn single(map: WireMap, placement: Placement) -> Self {
        Self {
            payload: WirePayload::Single(map),
            placement,
        }
    }

    /// A batch request.
    pub fn batch(items: Vec<WireMap>, placement: Placement) -> Self {
        Self {
            payload: WirePayload::Batch(items),
            placement,
        }
    }

    /// Stamp the broker tag onto every object in the payload.
    pub(crate) fn stamp_tag(&mut self, tag: &str) {
        match &mut self.payload {
            WirePayload::Single(map) => map.stamp_tag(tag),
            WirePayload::Batch(items) => items.iter_mut().for_each(|m| m.stamp_tag(tag)),
        }
    }

    pub fn payload(&self) -> &WirePayload {
        &self.payload
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// The single object, if this is not a batch.
    pub fn single_map(&self) -> Option<&WireMap> {
        match &self.payload {
            WirePayload::Single(map) => Some(map),
            WirePayload::Batch(_) => None,
        }
    }

    /// JSON body text. Empty objects render as `{}`.
    pub fn to_json_body(&self) -> WireResult<String> {
        let rendered = match &self.payload {
            WirePayload::Single(map) => serde_json::to_string(map),
            WirePayload::Batch(items) => serde_json::to_string(items),
        };
        rendered.map_err(|e| WireError::Placement(e.to_string()))
    }

    /// Query string without the leading `?`. Batches cannot go in a query.
    pub fn to_query_string(&self) -> WireResult<String> {
        match &self.payload {
            WirePayload::Single(map) => map.to_query_string(),
            WirePayload::Batch(_) => Err(WireError::Placement(
                "batch payload cannot be sent as a query string".to_string(),
            )),
        }
    }

    /// Objects for the `args` array of a WebSocket envelope.
    pub fn envelope_args(&self) -> Vec<&WireMap> {
        match &self.payload {
            WirePayload::Single(map) => vec![map],
            WirePayload::Batch(items) => items.iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::enums::{OrderSide, OrderType};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_absent_optional_is_omitted() {
        let map = WireMap::new()
            .required("instId", "BTC-USDT")
            .unwrap()
            .optional::<String>("clOrdId", None)
            .unwrap();

        assert!(!map.contains_key("clOrdId"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_falsy_optional_is_written() {
        let map = WireMap::new()
            .optional("reduceOnly", Some(&false))
            .unwrap()
            .optional("lever", Some(&0u32))
            .unwrap()
            .optional("clOrdId", Some(&String::new()))
            .unwrap();

        assert_eq!(map.get("reduceOnly"), Some(&WireValue::Bool(false)));
        assert_eq!(map.get_str("lever"), Some("0"));
        assert_eq!(map.get_str("clOrdId"), Some(""));
    }

    #[test]
    fn test_required_empty_string_is_missing() {
        let err = WireMap::new().required("instId", "").unwrap_err();
        assert_eq!(err, WireError::MissingField("instId"));
    }

    #[test]
    fn test_required_opt_none_is_missing() {
        let err = WireMap::new()
            .required_opt::<Decimal>("sz", None)
            .unwrap_err();
        assert_eq!(err, WireError::MissingField("sz"));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = WireMap::new()
            .required("instId", "BTC-USDT")
            .unwrap()
            .required("instId", "ETH-USDT")
            .unwrap_err();
        assert_eq!(err, WireError::DuplicateKey("instId".to_string()));
    }

    #[test]
    fn test_require_any() {
        let map = WireMap::new().optional("clOrdId", Some(&"abc")).unwrap();
        assert!(map.require_any(&["ordId", "clOrdId"], "ordId|clOrdId").is_ok());

        let err = WireMap::new()
            .require_any(&["ordId", "clOrdId"], "ordId|clOrdId")
            .unwrap_err();
        assert_eq!(err, WireError::MissingField("ordId|clOrdId"));
    }

    #[test]
    fn test_enum_and_decimal_rendering() {
        let map = WireMap::new()
            .required_enum("side", OrderSide::Buy)
            .unwrap()
            .required_enum("ordType", OrderType::Limit)
            .unwrap()
            .required("sz", &dec("1.50"))
            .unwrap();

        assert_eq!(
            serde_json::to_string(&map).unwrap(),
            r#"{"side":"buy","ordType":"limit","sz":"1.5"}"#
        );
    }

    #[test]
    fn test_unrecognized_enum_fails_fast() {
        let echoed = Wire::<OrderSide>::decode("hold");
        let err = WireMap::new().required("side", &echoed).unwrap_err();
        assert!(matches!(err, WireError::UnencodableEnum { kind: "OrderSide", .. }));
    }

    #[test]
    fn test_stamp_tag_goes_first_and_replaces() {
        let mut map = WireMap::new().required("instId", "BTC-USDT").unwrap();
        map.stamp_tag("sdk");
        map.stamp_tag("sdk2");
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["tag", "instId"]);
        assert_eq!(map.get_str("tag"), Some("sdk2"));
    }

    #[test]
    fn test_query_string() {
        let map = WireMap::new()
            .required("instType", "SPOT")
            .unwrap()
            .optional("after", Some(&"123 456"))
            .unwrap();
        assert_eq!(map.to_query_string().unwrap(), "instType=SPOT&after=123+456");
    }

    #[test]
    fn test_nested_value_rejected_in_query() {
        let map = WireMap::new()
            .required("fromCcy", &vec!["BTC".to_string()])
            .unwrap();
        assert!(matches!(map.to_query_string(), Err(WireError::Placement(_))));
    }

    #[test]
    fn test_batch_body_is_array() {
        let a = WireMap::new().required("instId", "BTC-USDT").unwrap();
        let b = WireMap::new().required("instId", "ETH-USDT").unwrap();
        let mut request = WireRequest::batch(vec![a, b], Placement::Body);
        request.stamp_tag("sdk");

        assert_eq!(
            request.to_json_body().unwrap(),
            r#"[{"tag":"sdk","instId":"BTC-USDT"},{"tag":"sdk","instId":"ETH-USDT"}]"#
        );
        assert!(request.to_query_string().is_err());
        assert_eq!(request.envelope_args().len(), 2);
    }

    #[test]
    fn test_empty_body() {
        let request = WireRequest::single(WireMap::new(), Placement::Body);
        assert_eq!(request.to_json_body().unwrap(), "{}");
    }
}
