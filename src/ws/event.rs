use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::command::{SubscribeFeed, SubscribeWallet, UnsubscribeFeed, UnsubscribeWallet};
use crate::events::{DecodeError, EventRegistry, TxEvent, decode_tx_event};

/// Error pushed by the server, e.g. for a rejected subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WsEventError(pub String);

impl WsEventError {
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WsEventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for WsEventError {}

// The server sends a bare string; some deployments wrap it as {"message": ..}.
impl<'de> Deserialize<'de> for WsEventError {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Object {
                #[serde(default)]
                message: String,
            },
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Text(message)) | Some(Raw::Object { message }) => WsEventError(message),
            None => WsEventError::default(),
        })
    }
}

/// One inbound frame, resolved by its `type`.
#[derive(Debug)]
pub enum WsEvent {
    Error(WsEventError),
    Tx(TxEvent),
    WalletSubscribed(SubscribeWallet),
    WalletUnsubscribed(UnsubscribeWallet),
    FeedSubscribed(SubscribeFeed),
    FeedUnsubscribed(UnsubscribeFeed),
}

impl WsEvent {
    pub const ERROR: &'static str = "error";
    pub const TX: &'static str = "tx";
    pub const WALLET_SUBSCRIBED: &'static str = "wallet_subscribed";
    pub const WALLET_UNSUBSCRIBED: &'static str = "wallet_unsubscribed";
    pub const FEED_SUBSCRIBED: &'static str = "feed_subscribed";
    pub const FEED_UNSUBSCRIBED: &'static str = "feed_unsubscribed";

    pub fn event_type(&self) -> &'static str {
        match self {
            WsEvent::Error(_) => Self::ERROR,
            WsEvent::Tx(_) => Self::TX,
            WsEvent::WalletSubscribed(_) => Self::WALLET_SUBSCRIBED,
            WsEvent::WalletUnsubscribed(_) => Self::WALLET_UNSUBSCRIBED,
            WsEvent::FeedSubscribed(_) => Self::FEED_SUBSCRIBED,
            WsEvent::FeedUnsubscribed(_) => Self::FEED_UNSUBSCRIBED,
        }
    }

    /// Decode a `{"type": .., "data": ..}` frame.
    ///
    /// `tx` data goes through [`decode_tx_event`] with `registry`; an
    /// unknown `type` is an error.
    pub fn decode(frame: &Value, registry: &EventRegistry) -> Result<Self, DecodeError> {
        let event_type = frame
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DecodeError::UnknownEventType(String::new()))?;
        let data = frame.get("data").unwrap_or(&Value::Null);

        let wrap = |source: DecodeError| DecodeError::EventData {
            event_type: event_type.to_string(),
            source: Box::new(source),
        };

        let event = match event_type {
            Self::ERROR => WsEvent::Error(ack(data).map_err(wrap)?),
            Self::TX => WsEvent::Tx(decode_tx_event(data, registry).map_err(wrap)?),
            Self::WALLET_SUBSCRIBED => WsEvent::WalletSubscribed(ack(data).map_err(wrap)?),
            Self::WALLET_UNSUBSCRIBED => WsEvent::WalletUnsubscribed(ack(data).map_err(wrap)?),
            Self::FEED_SUBSCRIBED => WsEvent::FeedSubscribed(ack(data).map_err(wrap)?),
            Self::FEED_UNSUBSCRIBED => WsEvent::FeedUnsubscribed(ack(data).map_err(wrap)?),
            other => return Err(DecodeError::UnknownEventType(other.to_string())),
        };
        Ok(event)
    }

    pub fn from_slice(bytes: &[u8], registry: &EventRegistry) -> Result<Self, DecodeError> {
        let frame: Value = serde_json::from_slice(bytes).map_err(DecodeError::Malformed)?;
        Self::decode(&frame, registry)
    }
}

// Ack echoes may carry `null` data.
fn ack<T: DeserializeOwned>(data: &Value) -> Result<T, DecodeError> {
    let result = match data {
        Value::Null => T::deserialize(&Value::Object(Map::new())),
        data => T::deserialize(data),
    };
    result.map_err(DecodeError::Malformed)
}

impl Serialize for WsEvent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut frame = serializer.serialize_struct("WsEvent", 2)?;
        frame.serialize_field("type", self.event_type())?;
        match self {
            WsEvent::Error(e) => frame.serialize_field("data", e)?,
            WsEvent::Tx(tx) => frame.serialize_field("data", tx)?,
            WsEvent::WalletSubscribed(ack) => frame.serialize_field("data", ack)?,
            WsEvent::WalletUnsubscribed(ack) => frame.serialize_field("data", ack)?,
            WsEvent::FeedSubscribed(ack) => frame.serialize_field("data", ack)?,
            WsEvent::FeedUnsubscribed(ack) => frame.serialize_field("data", ack)?,
        }
        frame.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{SwapEvent, TxKind};
    use serde_json::json;

    fn decode(frame: Value) -> Result<WsEvent, DecodeError> {
        WsEvent::decode(&frame, EventRegistry::standard())
    }

    // ── tx frames ──────────────────────────────────────────────────

    #[test]
    fn tx_frame_decodes_swap() {
        let event = decode(json!({
            "type": "tx",
            "data": {
                "tx_type": "swap",
                "wallet": "0xabc",
                "amount": "1.5",
                "amount_usd": 150.0,
                "chain": "ethereum",
                "token_symbol": "WETH"
            }
        }))
        .unwrap();

        assert_eq!(event.event_type(), "tx");
        let WsEvent::Tx(tx) = event else {
            panic!("expected tx event");
        };
        let swap = tx.payload_as::<SwapEvent>().expect("swap payload");
        assert_eq!(swap.amount_usd, 150.0);
        assert_eq!(swap.amount, 1.5);
        assert_eq!(swap.header.wallet, "0xabc");
    }

    #[test]
    fn tx_frame_with_unknown_kind_has_no_payload() {
        let event = decode(json!({
            "type": "tx",
            "data": {"tx_type": "totally_new_kind", "wallet": "0xabc"}
        }))
        .unwrap();

        let WsEvent::Tx(tx) = event else {
            panic!("expected tx event");
        };
        assert_eq!(tx.header.wallet, "0xabc");
        assert_eq!(tx.kind(), &TxKind::Other("totally_new_kind".into()));
        assert!(tx.payload.is_none());
    }

    #[test]
    fn tx_frame_with_bad_field_names_event_type() {
        let err = decode(json!({
            "type": "tx",
            "data": {"tx_type": "swap", "amount_usd": "lots"}
        }))
        .unwrap_err();

        match &err {
            DecodeError::EventData { event_type, source } => {
                assert_eq!(event_type, "tx");
                assert_eq!(source.discriminator(), Some("swap"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    // ── acks and errors ────────────────────────────────────────────

    #[test]
    fn acks_decode_to_command_echoes() {
        let event = decode(json!({
            "type": "wallet_subscribed",
            "data": {"wallet": "0xabc", "filter": {"chains": ["base"]}}
        }))
        .unwrap();
        let WsEvent::WalletSubscribed(ack) = event else {
            panic!("expected wallet_subscribed");
        };
        assert_eq!(ack.wallet, "0xabc");
        assert!(ack.filter.is_some());

        let event = decode(json!({"type": "feed_subscribed", "data": {"list_id": 7}})).unwrap();
        assert!(matches!(event, WsEvent::FeedSubscribed(SubscribeFeed { list_id: Some(7), .. })));

        let event = decode(json!({"type": "wallet_unsubscribed", "data": {"wallet": "0x1"}})).unwrap();
        assert!(matches!(event, WsEvent::WalletUnsubscribed(_)));
    }

    #[test]
    fn ack_with_null_data() {
        let event = decode(json!({"type": "feed_unsubscribed", "data": null})).unwrap();
        assert!(matches!(event, WsEvent::FeedUnsubscribed(_)));

        let event = decode(json!({"type": "feed_subscribed"})).unwrap();
        assert!(matches!(event, WsEvent::FeedSubscribed(SubscribeFeed { list_id: None, filter: None })));
    }

    #[test]
    fn error_frame_as_string_or_object() {
        let event = decode(json!({"type": "error", "data": "invalid wallet"})).unwrap();
        let WsEvent::Error(err) = event else {
            panic!("expected error event");
        };
        assert_eq!(err.message(), "invalid wallet");

        let event = decode(json!({"type": "error", "data": {"message": "rate limited"}})).unwrap();
        let WsEvent::Error(err) = event else {
            panic!("expected error event");
        };
        assert_eq!(err.to_string(), "rate limited");
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let err = decode(json!({"type": "heartbeat", "data": {}})).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownEventType(ref t) if t == "heartbeat"));

        let err = decode(json!({"data": {}})).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownEventType(_)));
    }

    #[test]
    fn malformed_bytes() {
        let err = WsEvent::from_slice(b"{not json", EventRegistry::standard()).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn serializes_as_type_and_data() {
        let event = decode(json!({"type": "wallet_subscribed", "data": {"wallet": "0xabc"}})).unwrap();
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "wallet_subscribed", "data": {"wallet": "0xabc"}})
        );

        let event = WsEvent::Error(WsEventError("boom".into()));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "error", "data": "boom"})
        );
    }
}
