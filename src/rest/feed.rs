use serde::{Deserialize, Serialize};

use super::CieloClient;
use super::response::Paging;
use crate::error::Result;
use crate::events::TxEvent;
use crate::filter::Filter;

/// Query for `GET /v1/feed`. Unset fields are left out of the query string.
#[derive(Debug, Clone, Default)]
pub struct FeedRequest {
    pub wallet: Option<String>,
    /// Page size, at most 100.
    pub limit: Option<u32>,
    pub list: Option<i64>,
    pub filter: Filter,
    /// `paging.next_object` of the previous page.
    pub start_from: Option<String>,
    pub from_timestamp: Option<i64>,
    pub to_timestamp: Option<i64>,
    pub max_usd: Option<f64>,
    /// Doubles the credit cost of the request.
    pub include_market_cap: Option<bool>,
}

impl FeedRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wallet(mut self, wallet: impl Into<String>) -> Self {
        self.wallet = Some(wallet.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn list(mut self, list_id: i64) -> Self {
        self.list = Some(list_id);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn start_from(mut self, cursor: impl Into<String>) -> Self {
        self.start_from = Some(cursor.into());
        self
    }

    pub fn between(mut self, from: i64, to: i64) -> Self {
        self.from_timestamp = Some(from);
        self.to_timestamp = Some(to);
        self
    }

    pub fn max_usd(mut self, value: f64) -> Self {
        self.max_usd = Some(value);
        self
    }

    pub fn include_market_cap(mut self, on: bool) -> Self {
        self.include_market_cap = Some(on);
        self
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(wallet) = self.wallet.as_ref().filter(|w| !w.is_empty()) {
            query.push(("wallet", wallet.clone()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(list) = self.list {
            query.push(("list", list.to_string()));
        }
        self.filter.append_query(&mut query);
        if let Some(cursor) = &self.start_from {
            query.push(("startFrom", cursor.clone()));
        }
        if let Some(ts) = self.from_timestamp {
            query.push(("fromTimestamp", ts.to_string()));
        }
        if let Some(ts) = self.to_timestamp {
            query.push(("toTimestamp", ts.to_string()));
        }
        if let Some(max) = self.max_usd {
            query.push(("maxUSD", max.to_string()));
        }
        if let Some(on) = self.include_market_cap {
            query.push(("includeMarketCap", on.to_string()));
        }
        query
    }
}

/// One page of the transaction feed.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedResponse {
    /// Decoded through the standard event registry; kinds it does not know
    /// come back without a payload.
    pub items: Vec<TxEvent>,
    pub paging: Paging,
}

impl CieloClient {
    /// Fetch one page of the transaction feed.
    pub async fn get_feed(&self, req: &FeedRequest) -> Result<FeedResponse> {
        self.get(&["v1", "feed", ""], &req.query()).await
    }
}
