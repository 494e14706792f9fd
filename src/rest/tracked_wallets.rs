use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::CieloClient;
use crate::error::Result;

/// Blockchain family of a tracked wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletType {
    #[default]
    Unknown,
    Evm,
    Solana,
    Dydx,
    Bitcoin,
    Tron,
    #[serde(untagged)]
    Other(String),
}

/// A user-defined list of wallets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletList {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
    pub bot_id: i64,
    pub description: String,
    pub is_public: bool,
    pub followed_count: i64,
    pub wallets_count: i64,
    pub share_url: String,
    pub image_url: String,
    pub followed: bool,
    pub is_creator: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackedWallet {
    pub id: i64,
    pub wallet: String,
    pub label: String,
    #[serde(rename = "type")]
    pub wallet_type: WalletType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<WalletList>,
}

#[derive(Debug, Clone, Default)]
pub struct GetTrackedWalletsRequest {
    pub list_id: Option<i64>,
    /// `paging.next_object` of the previous page.
    pub next_object: Option<i64>,
}

impl GetTrackedWalletsRequest {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(list_id) = self.list_id.filter(|id| *id != 0) {
            query.push(("list_id", list_id.to_string()));
        }
        if let Some(cursor) = self.next_object.filter(|c| *c != 0) {
            query.push(("next_object", cursor.to_string()));
        }
        query
    }
}

/// Paging for tracked wallets; the cursor here is numeric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackedWalletPaging {
    pub has_next_page: bool,
    pub total_rows_in_page: i64,
    #[serde(deserialize_with = "crate::de::lenient_i64")]
    pub next_object: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackedWalletsPage {
    pub tracked_wallets: Vec<TrackedWallet>,
    pub paging: TrackedWalletPaging,
}

/// Body of `POST /v1/tracked-wallets`. Only `wallet` and `label` are
/// required; the rest configure notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddTrackedWalletRequest {
    pub wallet: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount_usd: Option<f64>,
    /// Transaction-type filter ids.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<i64>,
    /// Chain ids.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chains: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_trades: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_bot_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord_channel_id: Option<String>,
}

impl AddTrackedWalletRequest {
    pub fn new(wallet: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            wallet: wallet.into(),
            label: label.into(),
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct RemoveTrackedWallets<'a> {
    wallet_ids: &'a [i64],
}

impl CieloClient {
    pub async fn get_tracked_wallets(
        &self,
        req: &GetTrackedWalletsRequest,
    ) -> Result<TrackedWalletsPage> {
        self.get(&["v1", "tracked-wallets"], &req.query()).await
    }

    pub async fn add_tracked_wallet(&self, req: &AddTrackedWalletRequest) -> Result<TrackedWallet> {
        self.send_json(Method::POST, &["v1", "tracked-wallets"], req)
            .await
    }

    /// Stop tracking the wallets with the given ids.
    pub async fn remove_tracked_wallets(&self, wallet_ids: &[i64]) -> Result<()> {
        let body = RemoveTrackedWallets { wallet_ids };
        self.send_json_unit(Method::DELETE, &["v1", "tracked-wallets"], &body)
            .await
    }

    /// Look up a tracked wallet by address; 404 when it is not tracked.
    pub async fn get_wallet_by_address(&self, wallet: &str) -> Result<TrackedWallet> {
        self.get(&["v1", "tracked-wallets", "address", wallet], &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[test]
    fn add_request_omits_unset_settings() {
        let req = AddTrackedWalletRequest::new("0xabc", "whale");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"wallet": "0xabc", "label": "whale"})
        );
    }

    #[test]
    fn wallet_type_keeps_unknown_values() {
        let wallet: TrackedWallet =
            serde_json::from_value(json!({"id": 1, "wallet": "x", "type": "cosmos"})).unwrap();
        assert_eq!(wallet.wallet_type, WalletType::Other("cosmos".into()));

        let wallet: TrackedWallet = serde_json::from_value(json!({"id": 2, "type": "evm"})).unwrap();
        assert_eq!(wallet.wallet_type, WalletType::Evm);
    }

    #[tokio::test]
    async fn lists_tracked_wallets_with_cursor() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/tracked-wallets")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("list_id".into(), "12".into()),
                Matcher::UrlEncoded("next_object".into(), "40".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "status": "ok",
                    "data": {
                        "tracked_wallets": [{
                            "id": 41,
                            "wallet": "0xabc",
                            "label": "whale",
                            "type": "evm",
                            "list_id": 12,
                            "list": {"id": 12, "name": "funds", "wallets_count": 3, "is_public": true}
                        }],
                        "paging": {"has_next_page": false, "total_rows_in_page": 1, "next_object": 0}
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = CieloClient::new("k").with_base_url(server.url());
        let req = GetTrackedWalletsRequest {
            list_id: Some(12),
            next_object: Some(40),
        };
        let page = client.get_tracked_wallets(&req).await.unwrap();

        assert_eq!(page.tracked_wallets.len(), 1);
        let wallet = &page.tracked_wallets[0];
        assert_eq!(wallet.id, 41);
        assert_eq!(wallet.list_id, Some(12));
        let list = wallet.list.as_ref().unwrap();
        assert_eq!(list.name, "funds");
        assert!(list.is_public);
        assert!(!page.paging.has_next_page);
    }

    #[tokio::test]
    async fn add_posts_json_body() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/v1/tracked-wallets")
            .match_body(Matcher::Json(json!({
                "wallet": "0xabc",
                "label": "whale",
                "list_id": 7,
                "min_amount_usd": 1000.0,
                "chains": [1, 137]
            })))
            .with_status(200)
            .with_body(r#"{"status":"ok","data":{"id":99,"wallet":"0xabc","label":"whale","type":"evm","list_id":7}}"#)
            .create_async()
            .await;

        let client = CieloClient::new("k").with_base_url(server.url());
        let req = AddTrackedWalletRequest {
            list_id: Some(7),
            min_amount_usd: Some(1000.0),
            chains: vec![1, 137],
            ..AddTrackedWalletRequest::new("0xabc", "whale")
        };
        let wallet = client.add_tracked_wallet(&req).await.unwrap();
        assert_eq!(wallet.id, 99);
        assert_eq!(wallet.wallet_type, WalletType::Evm);
    }

    #[tokio::test]
    async fn remove_sends_wallet_ids() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("DELETE", "/v1/tracked-wallets")
            .match_body(Matcher::Json(json!({"wallet_ids": [1, 2, 3]})))
            .with_status(200)
            .with_body(r#"{"status":"ok"}"#)
            .create_async()
            .await;

        let client = CieloClient::new("k").with_base_url(server.url());
        client.remove_tracked_wallets(&[1, 2, 3]).await.unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn wallet_by_address() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/tracked-wallets/address/0xabc")
            .with_status(200)
            .with_body(r#"{"status":"ok","data":{"id":5,"wallet":"0xabc","label":"me","type":"solana"}}"#)
            .create_async()
            .await;

        let client = CieloClient::new("k").with_base_url(server.url());
        let wallet = client.get_wallet_by_address("0xabc").await.unwrap();
        assert_eq!(wallet.label, "me");
        assert_eq!(wallet.wallet_type, WalletType::Solana);
        assert!(wallet.list.is_none());
    }
}
