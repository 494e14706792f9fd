use serde::{Deserialize, Serialize};

use crate::chains::Chain;
use crate::events::TxKind;

/// Narrows which transactions a subscription or feed query returns.
///
/// Empty sets and zero thresholds mean "no constraint" and are left out of
/// both the command JSON and the query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tx_types: Vec<TxKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chains: Vec<Chain>,
    /// Token addresses or symbols.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
    #[serde(
        skip_serializing_if = "is_zero",
        deserialize_with = "crate::de::lenient_f64"
    )]
    pub min_usd_value: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub new_trade: bool,
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tx_type(mut self, kind: impl Into<TxKind>) -> Self {
        self.tx_types.push(kind.into());
        self
    }

    pub fn chain(mut self, chain: impl Into<Chain>) -> Self {
        self.chains.push(chain.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.tokens.push(token.into());
        self
    }

    pub fn min_usd(mut self, value: f64) -> Self {
        self.min_usd_value = value;
        self
    }

    pub fn new_trades_only(mut self, on: bool) -> Self {
        self.new_trade = on;
        self
    }

    /// True when the filter constrains nothing.
    pub fn is_empty(&self) -> bool {
        self == &Filter::default()
    }

    /// Append this filter as feed query parameters
    /// (`tx_types`, `chains`, `tokens`, `minUSD`, `newTrades`).
    pub fn append_query(&self, query: &mut Vec<(&'static str, String)>) {
        if !self.tx_types.is_empty() {
            query.push(("tx_types", join(self.tx_types.iter().map(TxKind::as_str))));
        }
        if !self.chains.is_empty() {
            query.push(("chains", join(self.chains.iter().map(Chain::as_str))));
        }
        if !self.tokens.is_empty() {
            query.push(("tokens", join(self.tokens.iter().map(String::as_str))));
        }
        if self.min_usd_value > 0.0 {
            query.push(("minUSD", self.min_usd_value.to_string()));
        }
        if self.new_trade {
            query.push(("newTrades", "true".to_string()));
        }
    }
}

pub(crate) fn join<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join(",")
}
