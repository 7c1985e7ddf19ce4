//! Reply envelope decoding shared by REST and WebSocket.
//!
//! Every OKX reply wraps its payload as `{"code": "0", "msg": "", "data": [...]}`.
//! A transport-level success can still carry an exchange-level failure in
//! `code`, and batch endpoints report one `sCode`/`sMsg` per submitted item.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::shared::operation::ResponseShape;

/// Exchange success code.
pub const SUCCESS_CODE: &str = "0";

/// Reply envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyEnvelope {
    #[serde(default, deserialize_with = "code_string")]
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Value,
}

impl ReplyEnvelope {
    pub fn is_success(&self) -> bool {
        self.code.is_empty() || self.code == SUCCESS_CODE
    }
}

/// Why a reply could not be turned into a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyError {
    /// The exchange rejected the request
    Exchange { code: String, message: String },
    /// The payload did not match the expected shape
    Decode(String),
}

/// Per-item status carried by batch and order-entry replies.
pub trait ItemStatus {
    fn s_code(&self) -> &str;
    fn s_msg(&self) -> &str;

    /// Whether this item succeeded.
    fn is_success(&self) -> bool {
        let code = self.s_code();
        code.is_empty() || code == SUCCESS_CODE
    }
}

pub(crate) fn code_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn data_items(data: Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Pull an item-level rejection out of a single-item reply.
fn item_rejection(item: &Value) -> Option<(String, String)> {
    let code = item.get("sCode")?.as_str()?;
    if code.is_empty() || code == SUCCESS_CODE {
        return None;
    }
    let message = item
        .get("sMsg")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some((code.to_string(), message))
}

/// Decode a reply envelope into `T`.
///
/// With `per_item_status`, a failing envelope code still yields the item
/// list, so partial batch failures reach the caller item by item.
pub fn decode_reply<T: DeserializeOwned>(
    envelope: ReplyEnvelope,
    shape: ResponseShape,
    per_item_status: bool,
) -> Result<T, ReplyError> {
    let success = envelope.is_success();
    let ReplyEnvelope { code, msg, data } = envelope;
    let items = data_items(data);

    if !success && !(per_item_status && !items.is_empty()) {
        if shape == ResponseShape::One {
            if let Some((code, message)) = items.first().and_then(item_rejection) {
                return Err(ReplyError::Exchange { code, message });
            }
        }
        return Err(ReplyError::Exchange { code, message: msg });
    }

    match shape {
        ResponseShape::One => {
            let first = items
                .into_iter()
                .next()
                .ok_or_else(|| ReplyError::Decode("reply contained no data".to_string()))?;
            serde_json::from_value(first).map_err(|e| ReplyError::Decode(e.to_string()))
        }
        ResponseShape::List => serde_json::from_value(Value::Array(items))
            .map_err(|e| ReplyError::Decode(e.to_string())),
    }
}
