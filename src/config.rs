use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::ws::{ClosePolicy, WsConfig};

/// Default config file path.
pub const CONFIG_PATH: &str = "cielo.toml";

/// Environment variable consulted when `api.api_key` is empty.
pub const API_KEY_ENV: &str = "CIELO_API_KEY";

/// Top-level client config deserialized from `cielo.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub websocket: WebsocketConfig,
}

/// Endpoints and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Falls back to `CIELO_API_KEY` when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
}

fn default_base_url() -> String {
    crate::API_BASE_URL.to_string()
}

fn default_ws_url() -> String {
    crate::WS_URL.to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            ws_url: default_ws_url(),
        }
    }
}

/// Connection tuning. A zero interval or timeout disables it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsocketConfig {
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Capacity of the event channel between listener and consumer.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_clean_close_codes")]
    pub clean_close_codes: Vec<u16>,
}

fn default_max_message_size() -> usize {
    WsConfig::DEFAULT_MAX_MESSAGE_SIZE
}

fn default_write_timeout_ms() -> u64 {
    WsConfig::DEFAULT_WRITE_TIMEOUT.as_millis() as u64
}

fn default_ping_interval() -> u64 {
    WsConfig::DEFAULT_PING_INTERVAL.as_secs()
}

fn default_read_timeout() -> u64 {
    WsConfig::DEFAULT_READ_TIMEOUT.as_secs()
}

fn default_channel_capacity() -> usize {
    64
}

fn default_clean_close_codes() -> Vec<u16> {
    ClosePolicy::default().clean_codes().to_vec()
}

impl Default for WebsocketConfig {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
            write_timeout_ms: default_write_timeout_ms(),
            ping_interval_secs: default_ping_interval(),
            read_timeout_secs: default_read_timeout(),
            channel_capacity: default_channel_capacity(),
            clean_close_codes: default_clean_close_codes(),
        }
    }
}

fn nonzero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl ClientConfig {
    /// Load config from the given TOML file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise start from defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write config to the given TOML file path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// The configured API key, or `CIELO_API_KEY` from the environment.
    pub fn api_key(&self) -> Result<String> {
        if !self.api.api_key.is_empty() {
            return Ok(self.api.api_key.clone());
        }
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => bail!("no api key: set api.api_key or {API_KEY_ENV}"),
        }
    }

    pub fn ws_config(&self) -> Result<WsConfig> {
        let ws = &self.websocket;
        if ws.write_timeout_ms == 0 {
            bail!("websocket.write_timeout_ms must be positive");
        }
        let mut config = WsConfig::new(self.api_key()?).with_url(&self.api.ws_url);
        config.max_message_size = ws.max_message_size;
        config.write_timeout = Duration::from_millis(ws.write_timeout_ms);
        config.ping_interval = nonzero_secs(ws.ping_interval_secs);
        config.read_timeout = nonzero_secs(ws.read_timeout_secs);
        config.close_policy = ClosePolicy::new(ws.clean_close_codes.iter().copied());
        Ok(config)
    }

    pub fn rest_client(&self) -> Result<crate::rest::CieloClient> {
        Ok(crate::rest::CieloClient::new(self.api_key()?).with_base_url(&self.api.base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.api.base_url, "https://feed-api.cielo.finance/api");
        assert_eq!(config.api.ws_url, "wss://feed-api.cielo.finance/api/v1/ws");
        assert_eq!(config.websocket.max_message_size, 512 * 1024);
        assert_eq!(config.websocket.write_timeout_ms, 1000);
        assert_eq!(config.websocket.clean_close_codes, vec![1000, 1001]);
    }

    #[test]
    fn builds_session_config() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            api_key = "abc"
            ws_url = "ws://127.0.0.1:9000/ws"

            [websocket]
            write_timeout_ms = 250
            ping_interval_secs = 0
            read_timeout_secs = 90
            clean_close_codes = [1000]
            "#,
        )
        .unwrap();

        let ws = config.ws_config().unwrap();
        assert_eq!(ws.api_key, "abc");
        assert_eq!(ws.url, "ws://127.0.0.1:9000/ws");
        assert_eq!(ws.write_timeout, Duration::from_millis(250));
        assert_eq!(ws.ping_interval, None);
        assert_eq!(ws.read_timeout, Some(Duration::from_secs(90)));
        assert!(ws.close_policy.is_clean(1000));
        assert!(!ws.close_policy.is_clean(1001));
    }

    #[test]
    fn zero_write_timeout_is_rejected() {
        let mut config = ClientConfig::default();
        config.api.api_key = "abc".into();
        config.websocket.write_timeout_ms = 0;
        assert!(config.ws_config().is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("cielo-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cielo.toml");

        let mut config = ClientConfig::default();
        config.api.api_key = "saved-key".into();
        config.websocket.channel_capacity = 8;
        config.save(&path).unwrap();

        let loaded = ClientConfig::load(&path).unwrap();
        assert_eq!(loaded.api.api_key, "saved-key");
        assert_eq!(loaded.websocket.channel_capacity, 8);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_error_with_path() {
        let err = ClientConfig::load(Path::new("/nonexistent/cielo.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/cielo.toml"));
    }
}
