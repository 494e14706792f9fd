use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cielo_client::config::{CONFIG_PATH, ClientConfig};
use cielo_client::reporter;
use cielo_client::ws::{
    SessionHooks, SubscribeFeed, SubscribeWallet, UnsubscribeFeed, UnsubscribeWallet, WsCommand,
    WsEvent, WsSession,
};
use cielo_client::{Chain, Filter, TxKind};

#[derive(Parser)]
#[command(name = "cielo-watch", about = "Stream Cielo wallet activity as JSON lines")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Wallet address to follow (repeatable)
    #[arg(long = "wallet")]
    wallets: Vec<String>,

    /// Follow the account feed
    #[arg(long)]
    feed: bool,

    /// Restrict the feed subscription to one wallet list
    #[arg(long)]
    list_id: Option<i64>,

    /// Only these transaction types (repeatable, e.g. swap)
    #[arg(long = "tx-type")]
    tx_types: Vec<String>,

    /// Only these chains (repeatable, e.g. ethereum)
    #[arg(long = "chain")]
    chains: Vec<String>,

    /// Only these tokens, by address or symbol (repeatable)
    #[arg(long = "token")]
    tokens: Vec<String>,

    /// Minimum USD value per transaction
    #[arg(long)]
    min_usd: Option<f64>,

    /// Only first-time token trades
    #[arg(long)]
    new_trades: bool,
}

impl Args {
    fn filter(&self) -> Option<Filter> {
        let mut filter = Filter::new().new_trades_only(self.new_trades);
        for kind in &self.tx_types {
            filter = filter.tx_type(TxKind::from(kind.as_str()));
        }
        for chain in &self.chains {
            filter = filter.chain(Chain::from(chain.as_str()));
        }
        for token in &self.tokens {
            filter = filter.token(token.as_str());
        }
        if let Some(min) = self.min_usd {
            filter = filter.min_usd(min);
        }
        (!filter.is_empty()).then_some(filter)
    }

    fn subscriptions(&self) -> Vec<Box<dyn WsCommand>> {
        let filter = self.filter();
        let mut commands: Vec<Box<dyn WsCommand>> = Vec::new();
        for wallet in &self.wallets {
            commands.push(Box::new(SubscribeWallet {
                wallet: wallet.clone(),
                filter: filter.clone(),
            }));
        }
        if self.feed || self.list_id.is_some() {
            commands.push(Box::new(SubscribeFeed {
                list_id: self.list_id,
                filter,
            }));
        }
        commands
    }

    fn unsubscriptions(&self) -> Vec<Box<dyn WsCommand>> {
        let mut commands: Vec<Box<dyn WsCommand>> = Vec::new();
        for wallet in &self.wallets {
            commands.push(Box::new(UnsubscribeWallet::new(wallet.as_str())));
        }
        if self.feed || self.list_id.is_some() {
            commands.push(Box::new(UnsubscribeFeed {}));
        }
        commands
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.wallets.is_empty() && !args.feed && args.list_id.is_none() {
        anyhow::bail!("Nothing to watch: pass --wallet, --feed or --list-id");
    }
    if args.min_usd.is_some_and(|v| v < 0.0) {
        anyhow::bail!("--min-usd must not be negative");
    }

    let config = ClientConfig::load_or_default(&args.config)?;
    let ws_config = config.ws_config()?;
    info!("Connecting to {}", ws_config.url);

    let hooks = SessionHooks::default().on_close(|code, reason| {
        info!("Server closed connection: code={code} reason={reason:?}");
    });
    let session = Arc::new(
        WsSession::connect(ws_config)
            .await
            .context("failed to open websocket session")?
            .with_hooks(hooks),
    );

    for command in args.subscriptions() {
        session
            .send_command(command.as_ref())
            .await
            .with_context(|| format!("failed to send {}", command.kind()))?;
        info!("Sent {}", command.kind());
    }

    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel(config.websocket.channel_capacity.max(1));
    let listener = {
        let session = session.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { session.run_listener(cancel, tx).await })
    };

    info!("Streaming events. Press Ctrl+C to stop.");
    let mut received = 0u64;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            event = rx.recv() => {
                let Some(event) = event else {
                    break;
                };
                if let WsEvent::Error(e) = &event {
                    warn!("Server error: {e}");
                }
                received += 1;
                reporter::report_event(&event);
            }
        }
    }

    cancel.cancel();
    let outcome = listener.await.context("listener task panicked")?;

    for command in args.unsubscriptions() {
        if let Err(e) = session.send_command(command.as_ref()).await {
            warn!("Failed to send {}: {e}", command.kind());
            break;
        }
    }
    session.close().await;
    info!("Received {received} event(s)");

    outcome.context("websocket listener failed")
}
