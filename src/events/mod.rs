//! Transaction events: the discriminated union behind the feed and `tx` frames.
//!
//! Every event is one flat JSON object. The common envelope fields
//! ([`TxHeader`]) sit next to the kind-specific fields, and `tx_type`
//! selects which payload struct the object decodes into.

pub mod decode;
pub mod registry;
pub mod variants;

use std::any::Any;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chains::Chain;

pub use decode::{DecodeError, decode_tx_event};
pub use registry::EventRegistry;
pub use variants::*;

/// Transaction-kind discriminator (`tx_type`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Bridge,
    Lending,
    Lp,
    NftLending,
    NftMint,
    NftTrade,
    NftTransfer,
    Swap,
    Transfer,
    ContractCreation,
    ContractInteraction,
    Flashloan,
    NftLiquidation,
    NftSweep,
    Option,
    Perp,
    Reward,
    Staking,
    SudoPool,
    Wrap,
    /// A kind this client version does not know about.
    #[serde(untagged)]
    Other(String),
}

impl TxKind {
    /// All kinds with a payload struct in this crate.
    pub const KNOWN: [TxKind; 20] = [
        TxKind::Bridge,
        TxKind::Lending,
        TxKind::Lp,
        TxKind::NftLending,
        TxKind::NftMint,
        TxKind::NftTrade,
        TxKind::NftTransfer,
        TxKind::Swap,
        TxKind::Transfer,
        TxKind::ContractCreation,
        TxKind::ContractInteraction,
        TxKind::Flashloan,
        TxKind::NftLiquidation,
        TxKind::NftSweep,
        TxKind::Option,
        TxKind::Perp,
        TxKind::Reward,
        TxKind::Staking,
        TxKind::SudoPool,
        TxKind::Wrap,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            TxKind::Bridge => "bridge",
            TxKind::Lending => "lending",
            TxKind::Lp => "lp",
            TxKind::NftLending => "nft_lending",
            TxKind::NftMint => "nft_mint",
            TxKind::NftTrade => "nft_trade",
            TxKind::NftTransfer => "nft_transfer",
            TxKind::Swap => "swap",
            TxKind::Transfer => "transfer",
            TxKind::ContractCreation => "contract_creation",
            TxKind::ContractInteraction => "contract_interaction",
            TxKind::Flashloan => "flashloan",
            TxKind::NftLiquidation => "nft_liquidation",
            TxKind::NftSweep => "nft_sweep",
            TxKind::Option => "option",
            TxKind::Perp => "perp",
            TxKind::Reward => "reward",
            TxKind::Staking => "staking",
            TxKind::SudoPool => "sudo_pool",
            TxKind::Wrap => "wrap",
            TxKind::Other(tag) => tag,
        }
    }
}

impl Default for TxKind {
    fn default() -> Self {
        TxKind::Other(String::new())
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for TxKind {
    fn from(tag: &str) -> Self {
        TxKind::KNOWN
            .iter()
            .find(|kind| kind.as_str() == tag)
            .cloned()
            .unwrap_or_else(|| TxKind::Other(tag.to_string()))
    }
}

/// Fields shared by every transaction event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxHeader {
    pub wallet: String,
    pub wallet_label: String,
    pub tx_hash: String,
    pub tx_type: TxKind,
    pub chain: Chain,
    /// Position of the event inside its transaction.
    #[serde(deserialize_with = "crate::de::lenient_i64")]
    pub index: i64,
    /// Unix seconds.
    #[serde(deserialize_with = "crate::de::lenient_i64")]
    pub timestamp: i64,
    #[serde(deserialize_with = "crate::de::lenient_i64")]
    pub block: i64,
}

impl TxHeader {
    /// Block time as UTC, `None` when the timestamp is out of range.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

/// A concrete transaction payload.
///
/// Implemented by the 20 structs in [`variants`]; downstream crates may add
/// their own and register them with an [`EventRegistry`].
pub trait TransactionEvent: fmt::Debug + Send + Sync + 'static {
    /// The discriminator this payload was decoded for.
    fn kind(&self) -> TxKind;

    /// Common envelope fields repeated inside the payload.
    fn header(&self) -> &TxHeader;

    /// Flat JSON object, envelope fields included.
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;

    fn as_any(&self) -> &dyn Any;
}

impl dyn TransactionEvent {
    pub fn downcast_ref<T: TransactionEvent>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A payload type with a fixed discriminator, constructible as an empty
/// decode target. Everything the registry needs to register it.
pub trait KnownEvent: TransactionEvent + Default + serde::de::DeserializeOwned {
    const TAG: &'static str;
}

/// One decoded transaction event: the envelope plus, when the kind is
/// registered, its payload.
#[derive(Debug)]
pub struct TxEvent {
    pub header: TxHeader,
    /// `None` when `header.tx_type` has no registered payload.
    pub payload: Option<Box<dyn TransactionEvent>>,
}

impl TxEvent {
    /// Decode with the standard registry.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, DecodeError> {
        decode_tx_event(value, EventRegistry::standard())
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(DecodeError::Malformed)?;
        Self::from_value(&value)
    }

    pub fn kind(&self) -> &TxKind {
        &self.header.tx_type
    }

    pub fn is_known(&self) -> bool {
        self.payload.is_some()
    }

    /// Payload as a concrete variant, `None` if absent or of another type.
    pub fn payload_as<T: TransactionEvent>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref::<T>())
    }
}

impl<'de> Deserialize<'de> for TxEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        TxEvent::from_value(&value).map_err(serde::de::Error::custom)
    }
}

impl Serialize for TxEvent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match &self.payload {
            Some(payload) => payload
                .to_json()
                .map_err(serde::ser::Error::custom)?
                .serialize(serializer),
            None => self.header.serialize(serializer),
        }
    }
}
