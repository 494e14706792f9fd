//! Fetch one page of the REST transaction feed and print it as pretty JSON.
//!
//! Item kinds the client does not know are printed with their envelope
//! fields only; a summary of kinds goes to stderr.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cielo_client::config::{CONFIG_PATH, ClientConfig};
use cielo_client::reporter;
use cielo_client::rest::FeedRequest;
use cielo_client::{Chain, Filter, TxKind};

#[derive(Parser)]
#[command(name = "cielo-feed", about = "Print one page of the Cielo transaction feed")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Only this wallet's transactions
    #[arg(long)]
    wallet: Option<String>,

    /// Only wallets in this list
    #[arg(long)]
    list: Option<i64>,

    /// Page size (max 100)
    #[arg(long, default_value_t = 20)]
    limit: u32,

    /// Cursor from a previous page's `paging.next_object`
    #[arg(long)]
    start_from: Option<String>,

    /// Only these transaction types (repeatable)
    #[arg(long = "tx-type")]
    tx_types: Vec<String>,

    /// Only these chains (repeatable)
    #[arg(long = "chain")]
    chains: Vec<String>,

    /// Minimum USD value per transaction
    #[arg(long)]
    min_usd: Option<f64>,
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
    if !(1..=100).contains(&args.limit) {
        anyhow::bail!("--limit must be between 1 and 100");
    }

    let config = ClientConfig::load_or_default(&args.config)?;
    let client = config.rest_client()?;

    let mut filter = Filter::new();
    for kind in &args.tx_types {
        filter = filter.tx_type(TxKind::from(kind.as_str()));
    }
    for chain in &args.chains {
        filter = filter.chain(Chain::from(chain.as_str()));
    }
    if let Some(min) = args.min_usd {
        filter = filter.min_usd(min);
    }

    let mut req = FeedRequest::new().limit(args.limit).filter(filter);
    req.wallet = args.wallet;
    req.list = args.list;
    req.start_from = args.start_from;

    let page = client.get_feed(&req).await.context("failed to fetch feed")?;

    let mut kinds: BTreeMap<String, usize> = BTreeMap::new();
    for item in &page.items {
        *kinds.entry(item.kind().to_string()).or_default() += 1;
    }
    let unknown = page.items.iter().filter(|item| !item.is_known()).count();
    info!(
        "Fetched {} item(s), {} of unknown kind, by type: {:?}",
        page.items.len(),
        unknown,
        kinds
    );
    if page.paging.has_next_page {
        info!("Next page: --start-from {}", page.paging.next_object);
    }

    reporter::report_pretty(&page);
    Ok(())
}
