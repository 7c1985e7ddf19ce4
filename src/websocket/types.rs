//! Message types for the OKX WebSocket protocol.
//!
//! Outbound frames are `{"id","op","args"}` envelopes. Inbound frames come in
//! four kinds: channel pushes (`arg` + `data`), query replies (`id` + `op`),
//! events (`subscribe`, `unsubscribe`, `error`, `login`, `notice`,
//! `channel-conn-count`) and the text keepalive `pong`.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::reply::{code_string, ReplyEnvelope, SUCCESS_CODE};
use crate::websocket::error::WebSocketError;

/// Text keepalive sent by the client.
pub const PING: &str = "ping";
/// Text keepalive answered by the server.
pub const PONG: &str = "pong";

// ============================================================================
// CHANNELS
// ============================================================================

/// Subscription argument: a channel name plus its qualifiers.
///
/// The server echoes it back in pushes and acks, so it doubles as the routing
/// key. Fields the server adds on its own (`uid`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelArg {
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inst_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inst_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inst_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ccy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uly: Option<String>,
}

impl ChannelArg {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            ..Default::default()
        }
    }

    pub fn with_inst_type(mut self, inst_type: impl Into<String>) -> Self {
        self.inst_type = Some(inst_type.into());
        self
    }

    pub fn with_inst_family(mut self, inst_family: impl Into<String>) -> Self {
        self.inst_family = Some(inst_family.into());
        self
    }

    pub fn with_inst_id(mut self, inst_id: impl Into<String>) -> Self {
        self.inst_id = Some(inst_id.into());
        self
    }

    pub fn with_currency(mut self, ccy: impl Into<String>) -> Self {
        self.ccy = Some(ccy.into());
        self
    }

    pub fn with_algo_id(mut self, algo_id: impl Into<String>) -> Self {
        self.algo_id = Some(algo_id.into());
        self
    }

    pub fn with_underlying(mut self, uly: impl Into<String>) -> Self {
        self.uly = Some(uly.into());
        self
    }

    /// Routing key for this argument.
    pub fn key(&self) -> ChannelKey {
        let parts = [
            Some(self.channel.as_str()),
            self.inst_type.as_deref(),
            self.inst_family.as_deref(),
            self.inst_id.as_deref(),
            self.ccy.as_deref(),
            self.algo_id.as_deref(),
            self.uly.as_deref(),
        ];
        let joined = parts
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect::<Vec<_>>()
            .join(":");
        ChannelKey(joined.trim_end_matches(':').to_string())
    }
}

/// Canonical identity of a subscription, e.g. `orders:SPOT::BTC-USDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelKey(String);

impl ChannelKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// OUTBOUND (Client → Server)
// ============================================================================

/// `{"id","op","args"}` envelope. Login carries no `id`.
#[derive(Debug, Serialize)]
pub(crate) struct OpEnvelope<'a, A: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    pub op: &'a str,
    pub args: A,
}

pub(crate) const OP_LOGIN: &str = "login";
pub(crate) const OP_SUBSCRIBE: &str = "subscribe";
pub(crate) const OP_UNSUBSCRIBE: &str = "unsubscribe";

// ============================================================================
// INBOUND (Server → Client)
// ============================================================================

/// A data push for one channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PushFrame {
    pub arg: ChannelArg,
    /// `snapshot` or `update` on channels that distinguish them
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub data: Vec<Value>,
}

impl PushFrame {
    /// Decode every `data` item as `T`.
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<Vec<T>, WebSocketError> {
        self.data
            .iter()
            .map(|item| T::deserialize(item).map_err(WebSocketError::from))
            .collect()
    }
}

/// `event` frames: acks, login results, errors, notices.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventFrame {
    pub event: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub arg: Option<ChannelArg>,
    #[serde(default, deserialize_with = "code_string")]
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub conn_id: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub conn_count: Option<String>,
}

impl EventFrame {
    pub fn is_success(&self) -> bool {
        self.event != "error" && (self.code.is_empty() || self.code == SUCCESS_CODE)
    }

    /// The ack as a data-less reply envelope.
    pub fn into_envelope(self) -> ReplyEnvelope {
        let code = if self.event == "error" && self.code.is_empty() {
            "-1".to_string()
        } else {
            self.code
        };
        ReplyEnvelope {
            code,
            msg: self.msg,
            data: Value::Null,
        }
    }
}

/// Reply to a correlated query.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct QueryReply {
    #[serde(deserialize_with = "code_string")]
    pub id: String,
    #[serde(default)]
    pub op: String,
    #[serde(flatten)]
    pub envelope: ReplyEnvelope,
}

/// Classified inbound frame.
#[derive(Debug, Clone)]
pub(crate) enum Inbound {
    Pong,
    Event(EventFrame),
    Push(PushFrame),
    Reply(QueryReply),
}

impl Inbound {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        if text == PONG {
            return Ok(Self::Pong);
        }
        let value: Value = serde_json::from_str(text)?;
        let (is_event, is_push, is_reply) = match value.as_object() {
            Some(obj) => (
                obj.contains_key("event"),
                obj.contains_key("arg") && obj.contains_key("data"),
                obj.contains_key("id"),
            ),
            None => return Err(serde::de::Error::custom("frame is not a JSON object")),
        };
        if is_event {
            Ok(Self::Event(serde_json::from_value(value)?))
        } else if is_push {
            Ok(Self::Push(serde_json::from_value(value)?))
        } else if is_reply {
            Ok(Self::Reply(serde_json::from_value(value)?))
        } else {
            Err(serde::de::Error::custom("unrecognized frame"))
        }
    }
}

// ============================================================================
// SESSION EVENTS
// ============================================================================

/// Lifecycle events surfaced through
/// [`OkxWebSocketSession::events`](crate::websocket::OkxWebSocketSession::events).
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Socket open
    Connected,
    /// Login accepted
    Authenticated,
    /// Socket closed
    Disconnected { code: Option<u16>, reason: String },
    /// About to retry after a backoff
    Reconnecting { attempt: u32 },
    /// Something went wrong without a caller to report it to
    Error(WebSocketError),
    /// Server notice, typically an upcoming service upgrade
    Notice { code: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_key_ignores_uid() {
        let sent = ChannelArg::new("orders")
            .with_inst_type("SPOT")
            .with_inst_id("BTC-USDT");
        let echoed: ChannelArg = serde_json::from_str(
            r#"{"channel":"orders","instType":"SPOT","instId":"BTC-USDT","uid":"77982378738415879"}"#,
        )
        .unwrap();
        assert_eq!(sent.key(), echoed.key());
        assert_eq!(sent.key().as_str(), "orders:SPOT::BTC-USDT");
    }

    #[test]
    fn test_channel_key_distinguishes_qualifiers() {
        let a = ChannelArg::new("orders").with_inst_type("SPOT");
        let b = ChannelArg::new("orders").with_inst_type("SWAP");
        assert_ne!(a.key(), b.key());
        assert_eq!(ChannelArg::new("account").key().as_str(), "account");
    }

    #[test]
    fn test_channel_arg_serialization_omits_absent() {
        let arg = ChannelArg::new("orders").with_inst_type("ANY");
        assert_eq!(
            serde_json::to_string(&arg).unwrap(),
            r#"{"channel":"orders","instType":"ANY"}"#
        );
    }

    #[test]
    fn test_envelope_serialization() {
        let arg = ChannelArg::new("orders").with_inst_type("ANY");
        let env = OpEnvelope {
            id: Some("7"),
            op: OP_SUBSCRIBE,
            args: [&arg],
        };
        assert_eq!(
            serde_json::to_string(&env).unwrap(),
            r#"{"id":"7","op":"subscribe","args":[{"channel":"orders","instType":"ANY"}]}"#
        );
    }

    #[test]
    fn test_parse_pong() {
        assert!(matches!(Inbound::parse("pong").unwrap(), Inbound::Pong));
    }

    #[test]
    fn test_parse_push() {
        let text = r#"{"arg":{"channel":"orders","instType":"SPOT","uid":"1"},"data":[{"ordId":"1"},{"ordId":"2"}]}"#;
        let Inbound::Push(frame) = Inbound::parse(text).unwrap() else {
            panic!("expected push");
        };
        assert_eq!(frame.arg.channel, "orders");
        assert_eq!(frame.data.len(), 2);

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Item {
            ord_id: String,
        }
        let items: Vec<Item> = frame.decode_data().unwrap();
        assert_eq!(items[1].ord_id, "2");
    }

    #[test]
    fn test_parse_query_reply() {
        let text = r#"{"id":"1512","op":"order","data":[{"ordId":"","sCode":"5XXXX","sMsg":"Not handled"}],"code":"1","msg":"","inTime":"1695190491421339","outTime":"1695190491423240"}"#;
        let Inbound::Reply(reply) = Inbound::parse(text).unwrap() else {
            panic!("expected reply");
        };
        assert_eq!(reply.id, "1512");
        assert_eq!(reply.op, "order");
        assert_eq!(reply.envelope.code, "1");
        assert!(!reply.envelope.is_success());
    }

    #[test]
    fn test_parse_events() {
        let Inbound::Event(ack) = Inbound::parse(
            r#"{"id":"3","event":"subscribe","arg":{"channel":"orders","instType":"ANY"},"connId":"a4d3ae55"}"#,
        )
        .unwrap() else {
            panic!("expected event");
        };
        assert!(ack.is_success());
        assert_eq!(ack.id.as_deref(), Some("3"));

        let Inbound::Event(err) = Inbound::parse(
            r#"{"event":"error","code":60012,"msg":"Invalid request","connId":"a4d3ae55"}"#,
        )
        .unwrap() else {
            panic!("expected event");
        };
        assert!(!err.is_success());
        let envelope = err.into_envelope();
        assert_eq!(envelope.code, "60012");

        let Inbound::Event(count) = Inbound::parse(
            r#"{"event":"channel-conn-count","channel":"orders","connCount":"2","connId":"abcd1239"}"#,
        )
        .unwrap() else {
            panic!("expected event");
        };
        assert_eq!(count.conn_count.as_deref(), Some("2"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Inbound::parse("[1,2]").is_err());
        assert!(Inbound::parse(r#"{"foo":1}"#).is_err());
        assert!(Inbound::parse("not json").is_err());
    }
}
