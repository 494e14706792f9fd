//! Concrete payload structs, one per `tx_type`.
//!
//! Each struct embeds the shared [`TxHeader`] and adds the fields the API
//! documents for that kind. Absent fields decode to their zero value.

use std::any::Any;

use serde::{Deserialize, Serialize};

use super::{KnownEvent, TransactionEvent, TxHeader, TxKind};
use crate::chains::Chain;
use crate::de::{lenient_f64, lenient_i64};

macro_rules! transaction_event {
    ($name:ident, $kind:ident, $tag:literal) => {
        impl TransactionEvent for $name {
            fn kind(&self) -> TxKind {
                TxKind::$kind
            }

            fn header(&self) -> &TxHeader {
                &self.header
            }

            fn to_json(&self) -> serde_json::Result<serde_json::Value> {
                serde_json::to_value(self)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        impl KnownEvent for $name {
            const TAG: &'static str = $tag;
        }
    };
}

/// Cross-chain bridge transfer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub from: String,
    pub to: String,
    pub from_label: String,
    pub to_label: String,
    pub token_address: String,
    pub token_name: String,
    pub token_symbol: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount_usd: f64,
    pub from_chain: Chain,
    pub to_chain: Chain,
    pub platform: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub price: f64,
    #[serde(rename = "type")]
    pub direction: String,
}

transaction_event!(BridgeEvent, Bridge, "bridge");

/// Deposit, borrow, repay or withdraw on a lending market.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub from: String,
    pub from_label: String,
    pub action: String,
    /// Token address.
    pub address: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount_usd: f64,
    pub dex: String,
    /// Position health after the action.
    #[serde(deserialize_with = "lenient_f64")]
    pub health_factor: f64,
    pub name: String,
    pub platform: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub price_usd: f64,
    pub symbol: String,
}

transaction_event!(LendingEvent, Lending, "lending");

/// Direction of a liquidity-pool action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LpAction {
    Add,
    Remove,
    #[serde(untagged)]
    Other(String),
}

impl Default for LpAction {
    fn default() -> Self {
        LpAction::Other(String::new())
    }
}

/// Liquidity added to or removed from a pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LpEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub dex: String,
    pub from: String,
    #[serde(rename = "type")]
    pub action: LpAction,
    pub token0_address: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub token0_amount: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub token0_amount_usd: f64,
    pub token0_name: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub token0_price_usd: f64,
    pub token0_symbol: String,
    pub token1_address: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub token1_amount: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub token1_amount_usd: f64,
    pub token1_name: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub token1_price_usd: f64,
    pub token1_symbol: String,
    /// Concentrated-liquidity range, zero for full-range pools.
    #[serde(deserialize_with = "lenient_f64")]
    pub lower_bound: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub upper_bound: f64,
}

transaction_event!(LpEvent, Lp, "lp");

/// Loan taken or given against an NFT.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NftLendingEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub from: String,
    pub to: String,
    pub from_label: String,
    pub to_label: String,
    pub thumbnail: String,
    pub image: String,
    pub action: String,
    pub currency_address: String,
    pub currency_symbol: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub interest: f64,
    pub nft_address: String,
    pub nft_name: String,
    pub nft_symbol: String,
    pub platform: String,
    pub nft_token_id: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub price: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub price_usd: f64,
    /// Loan duration as reported by the platform.
    #[serde(deserialize_with = "lenient_f64")]
    pub terms: f64,
    pub refinance: bool,
}

transaction_event!(NftLendingEvent, NftLending, "nft_lending");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NftMintEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub from: String,
    pub to: String,
    pub from_label: String,
    pub to_label: String,
    pub thumbnail: String,
    pub image: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount: f64,
    pub contract_address: String,
    /// `ERC721`, `ERC1155`, ...
    pub contract_type: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub fee: f64,
    pub nft_name: String,
    pub nft_symbol: String,
    pub nft_token_id: String,
    pub currency_symbol: String,
    #[serde(rename = "type")]
    pub mint_type: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub value: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub value_usd: f64,
}

transaction_event!(NftMintEvent, NftMint, "nft_mint");

/// NFT bought or sold on a marketplace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NftTradeEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub from: String,
    pub to: String,
    pub thumbnail: String,
    pub image: String,
    /// `buy` or `sell`.
    pub action: String,
    pub contract: String,
    pub marketplace: String,
    pub nft_address: String,
    pub nft_name: String,
    pub nft_symbol: String,
    pub nft_token_id: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub price: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub price_usd: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub profit: f64,
    pub currency_symbol: String,
    pub buyer: String,
    pub seller: String,
    pub token: String,
    /// First interaction between buyer and seller.
    pub first_interaction: bool,
    pub bid_accepted: bool,
}

transaction_event!(NftTradeEvent, NftTrade, "nft_trade");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NftTransferEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub from: String,
    pub to: String,
    pub from_label: String,
    pub to_label: String,
    pub thumbnail: String,
    pub image: String,
    pub contract_address: String,
    pub contract_type: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub fee: f64,
    pub nft_name: String,
    pub nft_symbol: String,
    pub nft_token_id: String,
    #[serde(rename = "type")]
    pub direction: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub value: f64,
}

transaction_event!(NftTransferEvent, NftTransfer, "nft_transfer");

/// Token swap on a DEX or aggregator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwapEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub from: String,
    pub to: String,
    pub from_label: String,
    pub to_label: String,
    pub token_address: String,
    pub token_name: String,
    pub token_symbol: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount_usd: f64,
    pub from_chain: Chain,
    pub to_chain: Chain,
    pub platform: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub price: f64,
    #[serde(rename = "type")]
    pub side: String,
}

transaction_event!(SwapEvent, Swap, "swap");

/// Plain token transfer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub from: String,
    pub to: String,
    pub from_label: String,
    pub to_label: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount_usd: f64,
    pub contract_address: String,
    pub name: String,
    pub symbol: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub token_price_usd: f64,
    /// `in` or `out` relative to the wallet.
    #[serde(rename = "type")]
    pub direction: String,
}

transaction_event!(TransferEvent, Transfer, "transfer");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractCreationEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount_usd: f64,
    pub contract_address: String,
    pub from: String,
    pub from_label: String,
}

transaction_event!(ContractCreationEvent, ContractCreation, "contract_creation");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractInteractionEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub from: String,
    pub to: String,
    pub contract_address: String,
    /// Human-readable contract name, e.g. `Uniswap V3`.
    pub contract_label: String,
}

transaction_event!(ContractInteractionEvent, ContractInteraction, "contract_interaction");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashloanEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub address: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount_usd: f64,
    pub dex: String,
    pub from: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub health_factor: f64,
    pub name: String,
    pub platform: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub price_usd: f64,
    pub symbol: String,
    pub to: String,
}

transaction_event!(FlashloanEvent, Flashloan, "flashloan");

/// NFT collateral seized by a lending platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NftLiquidationEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub contract_address: String,
    pub currency_address: String,
    pub currency_symbol: String,
    pub dex: String,
    pub from: String,
    pub nft_address: String,
    pub nft_name: String,
    pub nft_symbol: String,
    pub platform: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub price: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub price_usd: f64,
    pub to: String,
    pub token_id: String,
}

transaction_event!(NftLiquidationEvent, NftLiquidation, "nft_liquidation");

/// Several NFTs bought in one transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NftSweepEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub from: String,
    pub to: String,
    pub thumbnail: String,
    pub image: String,
    pub action: String,
    pub contract: String,
    pub marketplace: String,
    pub nft_address: String,
    pub nft_name: String,
    pub nft_symbol: String,
    pub nft_token_id: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub price: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub price_usd: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub profit: f64,
    pub currency_symbol: String,
    pub buyer: String,
    pub seller: String,
    pub token: String,
    pub first_interaction: bool,
    pub bid_accepted: bool,
}

transaction_event!(NftSweepEvent, NftSweep, "nft_sweep");

/// Options trade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub action: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount: f64,
    pub asset: String,
    pub dex: String,
    /// `call` or `put`.
    pub direction: String,
    pub expiry: String,
    pub from: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub option_price_usd: f64,
    pub position_status: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub spot_price_usd: f64,
    pub status: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub strike_price_usd: f64,
    pub to: String,
    #[serde(rename = "type")]
    pub option_type: String,
}

transaction_event!(OptionEvent, Option, "option");

/// Perpetual futures open, increase, reduce or close.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerpEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub action: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount_usd: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub average_price: f64,
    pub base_token_address: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub base_token_amount: f64,
    pub base_token_symbol: String,
    pub dex: String,
    pub from: String,
    pub liquidation: bool,
    #[serde(deserialize_with = "lenient_f64")]
    pub liquidation_price: f64,
    pub to: String,
    /// `long` or `short`.
    pub trade_direction: String,
    pub perp_details: String,
    pub token0_address: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub token0_amount: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub token0_amount_usd: f64,
    pub token0_name: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub token0_price_usd: f64,
    pub token0_symbol: String,
    pub token1_address: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub token1_amount: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub token1_amount_usd: f64,
    pub token1_name: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub token1_price_usd: f64,
    pub token1_symbol: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub realized_pnl: f64,
    pub is_nft_perp: bool,
    #[serde(deserialize_with = "lenient_f64")]
    pub position_size: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub position_size_usd: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub leverage: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub unrealized_pnl: f64,
}

transaction_event!(PerpEvent, Perp, "perp");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub address: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount_usd: f64,
    pub from: String,
    pub name: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub price_usd: f64,
    pub symbol: String,
}

transaction_event!(RewardEvent, Reward, "reward");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakingEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub from: String,
    pub to: String,
    pub from_label: String,
    pub to_label: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount_usd: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub token_price_usd: f64,
    pub contract_address: String,
    pub symbol: String,
    pub name: String,
    /// `stake` or `unstake`.
    pub action: String,
}

transaction_event!(StakingEvent, Staking, "staking");

/// Trade against a sudoswap NFT pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SudoPoolEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub dex: String,
    pub from: String,
    pub nft_address: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub nft_amount: i64,
    #[serde(deserialize_with = "lenient_f64")]
    pub nft_price: f64,
    pub nft_symbol: String,
    pub to: String,
    pub token0_address: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub token0_amount: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub token0_amount_usd: f64,
    pub token0_name: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub token0_price_usd: f64,
    pub token0_symbol: String,
}

transaction_event!(SudoPoolEvent, SudoPool, "sudo_pool");

/// Native token wrapped or unwrapped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapEvent {
    #[serde(flatten)]
    pub header: TxHeader,
    pub dex: String,
    pub from: String,
    pub to: String,
    pub action: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount_usd: f64,
    pub contract_address: String,
    pub name: String,
    pub symbol: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub token_price_usd: f64,
    pub token_type: String,
}

transaction_event!(WrapEvent, Wrap, "wrap");

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tags_match_kinds() {
        assert_eq!(SwapEvent::default().kind().as_str(), SwapEvent::TAG);
        assert_eq!(PerpEvent::default().kind().as_str(), PerpEvent::TAG);
        assert_eq!(OptionEvent::default().kind().as_str(), OptionEvent::TAG);
        assert_eq!(SudoPoolEvent::default().kind().as_str(), SudoPoolEvent::TAG);
        assert_eq!(
            ContractInteractionEvent::default().kind().as_str(),
            ContractInteractionEvent::TAG
        );
    }

    #[test]
    fn lp_action_decodes_known_and_unknown() {
        let lp: LpEvent = serde_json::from_value(json!({"type": "add"})).unwrap();
        assert_eq!(lp.action, LpAction::Add);
        let lp: LpEvent = serde_json::from_value(json!({"type": "rebalance"})).unwrap();
        assert_eq!(lp.action, LpAction::Other("rebalance".into()));
    }

    #[test]
    fn bridge_chains_are_typed() {
        let bridge: BridgeEvent = serde_json::from_value(json!({
            "tx_type": "bridge",
            "from_chain": "ethereum",
            "to_chain": "base",
            "amount": "2.5",
            "amount_usd": 5000
        }))
        .unwrap();
        assert_eq!(bridge.from_chain, Chain::Ethereum);
        assert_eq!(bridge.to_chain, Chain::Base);
        assert_eq!(bridge.amount, 2.5);
        assert_eq!(bridge.amount_usd, 5000.0);
    }

    #[test]
    fn perp_fields() {
        let perp: PerpEvent = serde_json::from_value(json!({
            "wallet": "0xabc",
            "tx_type": "perp",
            "chain": "arbitrum",
            "action": "open",
            "trade_direction": "long",
            "leverage": 10,
            "liquidation": false,
            "liquidation_price": "1800.5",
            "token0_symbol": "WETH",
            "position_size_usd": 25000.0
        }))
        .unwrap();
        assert_eq!(perp.header.wallet, "0xabc");
        assert_eq!(perp.header.chain, Chain::Arbitrum);
        assert_eq!(perp.trade_direction, "long");
        assert_eq!(perp.leverage, 10.0);
        assert_eq!(perp.liquidation_price, 1800.5);
        assert_eq!(perp.token0_symbol, "WETH");
    }

    #[test]
    fn nft_trade_flags() {
        let trade: NftTradeEvent = serde_json::from_value(json!({
            "tx_type": "nft_trade",
            "marketplace": "OpenSea",
            "price": 0.0151,
            "price_usd": 32.911356,
            "first_interaction": true,
            "bid_accepted": false
        }))
        .unwrap();
        assert_eq!(trade.marketplace, "OpenSea");
        assert!(trade.first_interaction);
        assert!(!trade.bid_accepted);
    }

    #[test]
    fn to_json_keeps_type_field_and_header() {
        let transfer = TransferEvent {
            header: TxHeader {
                wallet: "0x1".into(),
                tx_type: TxKind::Transfer,
                ..Default::default()
            },
            direction: "out".into(),
            amount_usd: 12.0,
            ..Default::default()
        };
        let value = transfer.to_json().unwrap();
        assert_eq!(value["wallet"], "0x1");
        assert_eq!(value["tx_type"], "transfer");
        assert_eq!(value["type"], "out");
        assert_eq!(value["amount_usd"], 12.0);
    }
}
