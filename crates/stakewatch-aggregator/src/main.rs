use anyhow::{Context, Result};
use clap::Parser;
use stakewatch_aggregator::{run_update, UpdateOutcome};
use stakewatch_common::{
    config::{AmountPolicy, UpdaterConfig, WalletCountMode},
    helius::HeliusClient,
    utils::SystemClock,
};
use stakewatch_store::{JsonFileStore, MemoryStore, SnapshotStore};
use std::path::PathBuf;
use tracing::info;

/// Extends the Jupiter staking series with every completed day since its last entry
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file; every field is optional
    #[arg(long)]
    config: Option<PathBuf>,

    /// Helius API key
    #[arg(long, env = "HELIUS_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Cumulative series JSON file
    #[arg(long)]
    series: Option<PathBuf>,

    /// Wallet snapshot JSON file
    #[arg(long)]
    wallet_state: Option<PathBuf>,

    /// Also write the series as CSV
    #[arg(long)]
    series_csv: Option<PathBuf>,

    /// Stop after this many pages
    #[arg(long)]
    max_pages: Option<u32>,

    /// Approximate active wallet counts instead of replaying the wallet snapshot
    #[arg(long)]
    estimate_wallets: bool,

    /// Count only the first tracked-token transfer of each transaction
    #[arg(long)]
    first_transfer_only: bool,

    /// Compute the update without writing any file
    #[arg(long)]
    dry_run: bool,
}

fn load_config(args: &Args) -> Result<UpdaterConfig> {
    let mut config = match &args.config {
        Some(path) => UpdaterConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => UpdaterConfig::default(),
    };

    config.helius.api_key = args.api_key.clone();
    if let Some(path) = &args.series {
        config.files.series_path = path.clone();
    }
    if let Some(path) = &args.wallet_state {
        config.files.wallet_state_path = path.clone();
    }
    if args.series_csv.is_some() {
        config.files.series_csv_path = args.series_csv.clone();
    }
    if args.max_pages.is_some() {
        config.paging.max_pages = args.max_pages;
    }
    if args.estimate_wallets {
        config.wallet_count_mode = WalletCountMode::Estimate;
    }
    if args.first_transfer_only {
        config.amount_policy = AmountPolicy::First;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let client = HeliusClient::new(config.helius.clone(), config.retry.clone());
    let files = JsonFileStore::from_config(&config.files);

    let outcome = if args.dry_run {
        info!("Dry run: state is read from disk but never written");
        let series = files.load_series().await.context("Failed to read the series")?;
        let wallets = if files.has_wallet_snapshot().await {
            Some(files.load_wallet_snapshot().await.context("Failed to read the wallet snapshot")?)
        } else {
            None
        };
        let scratch = MemoryStore::new(Some(series), wallets);
        run_update(&config, &client, &scratch, &SystemClock).await
    } else {
        run_update(&config, &client, &files, &SystemClock).await
    }
    .context("Update failed")?;

    match &outcome {
        UpdateOutcome::UpToDate { latest_date } => {
            info!("Nothing to do, series already ends at {}", latest_date);
        }
        UpdateOutcome::Updated(report) => {
            for day in &report.days {
                info!(
                    "{}: +{:.2} staked, -{:.2} withdrawn, net {:.2}, {} txs, {} wallets",
                    day.date, day.staked, day.withdrawn, day.net_change, day.transaction_count, day.active_wallets
                );
            }
            info!(
                "Latest: {} total staked {:.2}, active wallets {:?}",
                report.latest.date, report.latest.total_staked, report.latest.active_wallets
            );
        }
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
