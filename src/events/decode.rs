use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::registry::EventRegistry;
use super::{TxEvent, TxHeader};

/// A message that could not be decoded. Fatal for that message only.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed json: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("invalid tx event envelope (tx_type {tx_type:?}): {source}")]
    Envelope {
        tx_type: Option<String>,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode {tx_type:?} tx event payload: {source}")]
    Payload {
        tx_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("payload decoded as {found:?} for envelope tx_type {expected:?}")]
    KindMismatch { expected: String, found: String },

    #[error("unknown event type {0:?}")]
    UnknownEventType(String),

    #[error("failed to decode {event_type:?} event data: {source}")]
    EventData {
        event_type: String,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// The discriminator the failing message carried, if it got that far.
    pub fn discriminator(&self) -> Option<&str> {
        match self {
            DecodeError::Malformed(_) => None,
            DecodeError::Envelope { tx_type, .. } => tx_type.as_deref(),
            DecodeError::Payload { tx_type, .. } => Some(tx_type),
            DecodeError::KindMismatch { expected, .. } => Some(expected),
            DecodeError::UnknownEventType(event_type) => Some(event_type),
            DecodeError::EventData { event_type, .. } => Some(event_type),
        }
    }
}

/// Decode one flat transaction-event object.
///
/// The same object is read twice: once into the [`TxHeader`] to learn the
/// discriminator, then in full into the payload type `registry` maps it to.
/// An unregistered discriminator yields an envelope with no payload. Any
/// parse failure rejects the whole event.
pub fn decode_tx_event(value: &Value, registry: &EventRegistry) -> Result<TxEvent, DecodeError> {
    let header = TxHeader::deserialize(value).map_err(|source| DecodeError::Envelope {
        tx_type: value
            .get("tx_type")
            .and_then(Value::as_str)
            .map(str::to_string),
        source,
    })?;

    let tag = header.tx_type.as_str();
    let Some(decode) = registry.decoder(tag) else {
        debug!(tx_type = tag, tx_hash = %header.tx_hash, "unregistered tx_type, payload skipped");
        return Ok(TxEvent {
            header,
            payload: None,
        });
    };

    let payload = decode(value).map_err(|source| DecodeError::Payload {
        tx_type: tag.to_string(),
        source,
    })?;

    if payload.kind().as_str() != tag {
        return Err(DecodeError::KindMismatch {
            expected: tag.to_string(),
            found: payload.kind().to_string(),
        });
    }

    Ok(TxEvent {
        header,
        payload: Some(payload),
    })
}
