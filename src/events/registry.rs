use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::Deserialize;
use serde_json::Value;

use super::variants::*;
use super::{KnownEvent, TransactionEvent};

/// Builds an empty payload to decode into.
pub type NewFn = fn() -> Box<dyn TransactionEvent>;

/// Decodes a full event object into its payload.
pub type DecodeFn = fn(&Value) -> serde_json::Result<Box<dyn TransactionEvent>>;

#[derive(Clone, Copy)]
struct Entry {
    new: NewFn,
    decode: DecodeFn,
}

static STANDARD: LazyLock<EventRegistry> = LazyLock::new(EventRegistry::with_standard_kinds);

/// Maps a `tx_type` discriminator to the payload type it decodes into.
///
/// Lookups of unregistered tags return `None`; the decoder treats that as
/// "envelope only" so new upstream kinds never break older clients.
/// A registry is immutable once shared, so concurrent reads need no locking.
#[derive(Clone, Default)]
pub struct EventRegistry {
    entries: HashMap<&'static str, Entry>,
}

impl EventRegistry {
    /// A registry with no kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every payload type this crate defines.
    pub fn with_standard_kinds() -> Self {
        let mut registry = Self::new();
        registry
            .register::<BridgeEvent>()
            .register::<LendingEvent>()
            .register::<LpEvent>()
            .register::<NftLendingEvent>()
            .register::<NftMintEvent>()
            .register::<NftTradeEvent>()
            .register::<NftTransferEvent>()
            .register::<SwapEvent>()
            .register::<TransferEvent>()
            .register::<ContractCreationEvent>()
            .register::<ContractInteractionEvent>()
            .register::<FlashloanEvent>()
            .register::<NftLiquidationEvent>()
            .register::<NftSweepEvent>()
            .register::<OptionEvent>()
            .register::<PerpEvent>()
            .register::<RewardEvent>()
            .register::<StakingEvent>()
            .register::<SudoPoolEvent>()
            .register::<WrapEvent>();
        registry
    }

    /// Shared instance of [`EventRegistry::with_standard_kinds`].
    pub fn standard() -> &'static EventRegistry {
        &STANDARD
    }

    /// Register `T` under its own tag, replacing any previous entry.
    pub fn register<T: KnownEvent>(&mut self) -> &mut Self {
        self.register_fn(T::TAG, new_boxed::<T>, decode_boxed::<T>)
    }

    /// Register hand-written constructors under `tag`.
    pub fn register_fn(&mut self, tag: &'static str, new: NewFn, decode: DecodeFn) -> &mut Self {
        self.entries.insert(tag, Entry { new, decode });
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// An empty, zero-valued payload for `tag`.
    pub fn instantiate(&self, tag: &str) -> Option<Box<dyn TransactionEvent>> {
        self.entries.get(tag).map(|entry| (entry.new)())
    }

    pub fn decoder(&self, tag: &str) -> Option<DecodeFn> {
        self.entries.get(tag).map(|entry| entry.decode)
    }

    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.tags().collect();
        tags.sort_unstable();
        f.debug_struct("EventRegistry").field("tags", &tags).finish()
    }
}

fn new_boxed<T: KnownEvent>() -> Box<dyn TransactionEvent> {
    Box::new(T::default())
}

fn decode_boxed<T: KnownEvent>(value: &Value) -> serde_json::Result<Box<dyn TransactionEvent>> {
    let payload: Box<dyn TransactionEvent> = Box::new(T::deserialize(value)?);
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TxKind;

    #[test]
    fn standard_covers_every_known_kind() {
        let registry = EventRegistry::standard();
        assert_eq!(registry.len(), TxKind::KNOWN.len());
        for kind in TxKind::KNOWN {
            let payload = registry
                .instantiate(kind.as_str())
                .unwrap_or_else(|| panic!("{kind} not registered"));
            assert_eq!(payload.kind(), kind);
        }
    }

    #[test]
    fn unknown_tag_is_none() {
        let registry = EventRegistry::standard();
        assert!(registry.instantiate("teleport").is_none());
        assert!(registry.decoder("").is_none());
        assert!(!registry.contains("SWAP"));
    }

    #[test]
    fn instantiated_payload_is_zero_valued() {
        let payload = EventRegistry::standard().instantiate("swap").unwrap();
        let swap = payload.downcast_ref::<SwapEvent>().unwrap();
        assert_eq!(swap, &SwapEvent::default());
    }

    #[test]
    fn custom_registry_only_knows_what_it_registers() {
        let mut registry = EventRegistry::new();
        registry.register::<SwapEvent>();
        assert!(registry.contains("swap"));
        assert!(!registry.contains("bridge"));
        assert_eq!(registry.tags().collect::<Vec<_>>(), vec!["swap"]);
    }
}
