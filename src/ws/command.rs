use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::filter::Filter;

/// Outgoing command discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    SubscribeWallet,
    UnsubscribeWallet,
    SubscribeFeed,
    UnsubscribeFeed,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::SubscribeWallet => "subscribe_wallet",
            CommandKind::UnsubscribeWallet => "unsubscribe_wallet",
            CommandKind::SubscribeFeed => "subscribe_feed",
            CommandKind::UnsubscribeFeed => "unsubscribe_feed",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command the session can send.
///
/// Each command builds its own flat JSON object. [`WsCommand::to_object`]
/// puts the `type` discriminator first and the fields from `encode` after
/// it, so absent optionals never reach the wire.
pub trait WsCommand: Send + Sync {
    fn kind(&self) -> CommandKind;

    /// Variant fields, without the discriminator.
    fn encode(&self) -> serde_json::Result<Map<String, Value>>;

    fn to_object(&self) -> serde_json::Result<Map<String, Value>> {
        let mut object = Map::new();
        object.insert("type".into(), Value::from(self.kind().as_str()));
        object.extend(self.encode()?);
        Ok(object)
    }

    fn to_text(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.to_object()?)
    }
}

fn insert_filter(object: &mut Map<String, Value>, filter: &Option<Filter>) -> serde_json::Result<()> {
    if let Some(filter) = filter {
        object.insert("filter".into(), serde_json::to_value(filter)?);
    }
    Ok(())
}

/// Follow one wallet. Also the body of the `wallet_subscribed` ack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscribeWallet {
    pub wallet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
}

impl SubscribeWallet {
    pub fn new(wallet: impl Into<String>) -> Self {
        Self {
            wallet: wallet.into(),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl WsCommand for SubscribeWallet {
    fn kind(&self) -> CommandKind {
        CommandKind::SubscribeWallet
    }

    fn encode(&self) -> serde_json::Result<Map<String, Value>> {
        let mut object = Map::new();
        object.insert("wallet".into(), Value::from(self.wallet.as_str()));
        insert_filter(&mut object, &self.filter)?;
        Ok(object)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnsubscribeWallet {
    pub wallet: String,
}

impl UnsubscribeWallet {
    pub fn new(wallet: impl Into<String>) -> Self {
        Self {
            wallet: wallet.into(),
        }
    }
}

impl WsCommand for UnsubscribeWallet {
    fn kind(&self) -> CommandKind {
        CommandKind::UnsubscribeWallet
    }

    fn encode(&self) -> serde_json::Result<Map<String, Value>> {
        let mut object = Map::new();
        object.insert("wallet".into(), Value::from(self.wallet.as_str()));
        Ok(object)
    }
}

/// Follow the account feed, or a single list of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscribeFeed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
}

impl SubscribeFeed {
    /// Every wallet the account tracks.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn list(list_id: i64) -> Self {
        Self {
            list_id: Some(list_id),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl WsCommand for SubscribeFeed {
    fn kind(&self) -> CommandKind {
        CommandKind::SubscribeFeed
    }

    fn encode(&self) -> serde_json::Result<Map<String, Value>> {
        let mut object = Map::new();
        if let Some(list_id) = self.list_id {
            object.insert("list_id".into(), Value::from(list_id));
        }
        insert_filter(&mut object, &self.filter)?;
        Ok(object)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnsubscribeFeed {}

impl WsCommand for UnsubscribeFeed {
    fn kind(&self) -> CommandKind {
        CommandKind::UnsubscribeFeed
    }

    fn encode(&self) -> serde_json::Result<Map<String, Value>> {
        Ok(Map::new())
    }
}
