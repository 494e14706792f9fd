use std::fmt;

use serde::{Deserialize, Serialize};

/// Blockchain identifier as used by the Cielo API (`"ethereum"`, `"solana"`, ...).
///
/// Chains the API adds later decode into [`Chain::Other`] instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Arbitrum,
    Aurora,
    Avalanche,
    Base,
    Blast,
    Bnb,
    Boba,
    Bitcoin,
    Degenchain,
    Dydx,
    Ethereum,
    Evmos,
    Fantom,
    Gnosis,
    Hyperevm,
    Linea,
    Mantle,
    Metis,
    Mode,
    Optimism,
    Opbnb,
    Polygon,
    Polygonzkevm,
    Pulsechain,
    Scroll,
    Solana,
    Tron,
    Zksync,
    #[serde(untagged)]
    Other(String),
}

impl Chain {
    pub fn as_str(&self) -> &str {
        match self {
            Chain::Arbitrum => "arbitrum",
            Chain::Aurora => "aurora",
            Chain::Avalanche => "avalanche",
            Chain::Base => "base",
            Chain::Blast => "blast",
            Chain::Bnb => "bnb",
            Chain::Boba => "boba",
            Chain::Bitcoin => "bitcoin",
            Chain::Degenchain => "degenchain",
            Chain::Dydx => "dydx",
            Chain::Ethereum => "ethereum",
            Chain::Evmos => "evmos",
            Chain::Fantom => "fantom",
            Chain::Gnosis => "gnosis",
            Chain::Hyperevm => "hyperevm",
            Chain::Linea => "linea",
            Chain::Mantle => "mantle",
            Chain::Metis => "metis",
            Chain::Mode => "mode",
            Chain::Optimism => "optimism",
            Chain::Opbnb => "opbnb",
            Chain::Polygon => "polygon",
            Chain::Polygonzkevm => "polygonzkevm",
            Chain::Pulsechain => "pulsechain",
            Chain::Scroll => "scroll",
            Chain::Solana => "solana",
            Chain::Tron => "tron",
            Chain::Zksync => "zksync",
            Chain::Other(name) => name,
        }
    }
}

impl Default for Chain {
    fn default() -> Self {
        Chain::Other(String::new())
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Chain {
    fn from(name: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(name.to_string()))
            .unwrap_or_else(|_| Chain::Other(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_chain_round_trips_as_plain_string() {
        let chain: Chain = serde_json::from_str("\"polygonzkevm\"").unwrap();
        assert_eq!(chain, Chain::Polygonzkevm);
        assert_eq!(serde_json::to_string(&chain).unwrap(), "\"polygonzkevm\"");
    }

    #[test]
    fn unknown_chain_is_preserved() {
        let chain: Chain = serde_json::from_str("\"sonic\"").unwrap();
        assert_eq!(chain, Chain::Other("sonic".into()));
        assert_eq!(chain.as_str(), "sonic");
        assert_eq!(serde_json::to_string(&chain).unwrap(), "\"sonic\"");
    }

    #[test]
    fn from_str_matches_serde_names() {
        assert_eq!(Chain::from("base"), Chain::Base);
        assert_eq!(Chain::from("opbnb"), Chain::Opbnb);
        assert_eq!(Chain::from("unichain").to_string(), "unichain");
    }
}
