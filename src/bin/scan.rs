// Command-line front end for composable-scan

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;

use composable_scan::{
    config::{CliArgs, Config},
    source_ws::HeadFollower,
    BatchFetcher, BlockDiscovery, Gateway, RollupRegistry, SearchResolver,
};

#[derive(Parser, Debug)]
#[command(name = "scan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search a rollup block explorer from the terminal", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: CliArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a free-form query (hash, height, namespace or rollup name)
    Search { query: String },
    /// Block by height
    Block { height: u64 },
    /// Block by hash (`BLOCK~` prefix optional)
    BlockHash { hash: String },
    /// Transaction by hash (`TX~` prefix optional)
    Tx { hash: String },
    /// Namespace slice of a block
    Namespace { height: u64, namespace: u64 },
    /// All transactions of a block
    Txs { height: u64 },
    /// Latest block height
    Head,
    /// Most recent blocks, newest first
    Recent {
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// Every registered rollup
    Rollups,
    /// Follow the block stream and print each new head
    Follow,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (safe to ignore if not found)
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let cfg = Config::from_args(cli.config).context("Failed to load configuration")?;
    cfg.print_summary();

    let gateway = Arc::new(Gateway::new(&cfg).context("Failed to build HTTP client")?);
    let registry = Arc::new(RollupRegistry::new(
        gateway.http_client().clone(),
        cfg.web_worker_url.clone(),
    ));

    match cli.command {
        Command::Search { query } => {
            let resolver = SearchResolver::new(gateway, registry);
            let results = resolver
                .search(&query)
                .await
                .with_context(|| format!("search '{query}' failed"))?;
            print_json(&results)?;
        }
        Command::Block { height } => print_json(&gateway.get_block_by_height(height).await?)?,
        Command::BlockHash { hash } => print_json(&gateway.get_block_by_hash(&hash).await?)?,
        Command::Tx { hash } => print_json(&gateway.get_transaction_by_hash(&hash).await?)?,
        Command::Namespace { height, namespace } => {
            print_json(&gateway.get_namespace_data(height, namespace).await?)?
        }
        Command::Txs { height } => {
            let batch = BatchFetcher::new(gateway);
            print_json(&batch.get_block_transactions(height).await?)?;
        }
        Command::Head => {
            let discovery = BlockDiscovery::new(gateway);
            let latest = discovery.discover_latest_height().await?;
            print_json(&serde_json::json!({ "latest": latest, "network": cfg.network }))?;
        }
        Command::Recent { count } => {
            let discovery = BlockDiscovery::new(gateway);
            print_json(&discovery.get_recent_blocks(count).await?)?;
        }
        Command::Rollups => {
            registry.ensure_ready().await?;
            print_json(&registry.all_rollups())?;
        }
        Command::Follow => {
            let discovery = Arc::new(BlockDiscovery::new(gateway));
            let (tx, mut rx) = unbounded_channel::<u64>();
            let mut follower = HeadFollower::new(cfg.clone(), discovery).with_notify(tx);
            let printer = tokio::spawn(async move {
                while let Some(height) = rx.recv().await {
                    println!("{height}");
                }
            });
            let outcome = follower.run().await;
            printer.abort();
            outcome.context("block stream ended")?;
        }
    }

    Ok(())
}
