pub mod chains;
pub mod config;
pub mod de;
pub mod error;
pub mod events;
pub mod filter;
pub mod reporter;
pub mod rest;
pub mod ws;

pub use chains::Chain;
pub use error::Error;
pub use events::{
    DecodeError, EventRegistry, TransactionEvent, TxEvent, TxHeader, TxKind, decode_tx_event,
};
pub use filter::Filter;
pub use rest::CieloClient;
pub use ws::{WsCommand, WsConfig, WsError, WsEvent, WsSession};

/// REST API base URL
pub const API_BASE_URL: &str = "https://feed-api.cielo.finance/api";

/// WebSocket event stream URL
pub const WS_URL: &str = "wss://feed-api.cielo.finance/api/v1/ws";

/// Header carrying the API key on REST requests and the WebSocket upgrade
pub const API_KEY_HEADER: &str = "X-API-KEY";
