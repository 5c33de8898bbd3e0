//! Builds the wallet snapshot (and optionally the series baseline) from CSV exports

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use stakewatch_aggregator::wallet_state::{WalletStateStore, BALANCE_EPSILON};
use stakewatch_common::{types::WalletSnapshot, utils::parse_date};
use stakewatch_store::{csv, JsonFileStore, SnapshotStore};
use std::{fs::File, path::PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Builds wallet_states.json from a staking wallet CSV export", long_about = None)]
struct Args {
    /// `address,balance` export with a header row
    #[arg(long, default_value = "staking_wallets.csv")]
    wallets_csv: PathBuf,

    /// Date the balances were exported at (YYYY-MM-DD)
    #[arg(long, value_parser = parse_as_of)]
    as_of: NaiveDate,

    /// Wallet snapshot to write
    #[arg(long, default_value = "wallet_states.json")]
    output: PathBuf,

    /// Wallets to leave out of the snapshot
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// `Snapshot Date,Total Staked Amount` export to convert into the series baseline
    #[arg(long)]
    series_csv: Option<PathBuf>,

    /// Series JSON to write when --series-csv is given
    #[arg(long, default_value = "jupiter_combined_staking.json")]
    series_output: PathBuf,
}

fn parse_as_of(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let args = Args::parse();
    let store = JsonFileStore::new(&args.series_output, &args.output);

    let file = File::open(&args.wallets_csv)
        .with_context(|| format!("Failed to open {}", args.wallets_csv.display()))?;
    let balances = csv::read_wallet_balances(file, BALANCE_EPSILON).context("Failed to read wallet CSV")?;
    if balances.is_empty() {
        bail!("{} holds no wallet with a positive balance", args.wallets_csv.display());
    }

    let wallets = WalletStateStore::load(WalletSnapshot {
        as_of_date: args.as_of,
        wallets: balances,
    })?
    .with_exclusions(args.exclude.iter().cloned());

    let count = wallets.active_count();
    let total = wallets.total_staked();
    store.save_wallet_snapshot(&wallets.snapshot(args.as_of)).await?;

    info!("As of date: {}", args.as_of);
    info!("Total active wallets: {}", count);
    info!("Total staked amount: {:.2} JUP", total);
    if count > 0 {
        info!("Average balance: {:.2} JUP", total / count as f64);
    } else {
        warn!("Every wallet in {} is excluded", args.wallets_csv.display());
    }

    if let Some(path) = &args.series_csv {
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let mut series = csv::read_series_csv(file).context("Failed to read series CSV")?;
        let Some(head) = series.daily_data.first_mut() else {
            bail!("{} has no rows", path.display());
        };

        if head.date == args.as_of {
            head.active_wallets = Some(count as u64);
        } else {
            warn!(
                "Series ends at {} but wallets are as of {}; the first update will not line up",
                head.date, args.as_of
            );
        }
        if (head.total_staked - total).abs() > 1.0 {
            warn!(
                "Series total {:.2} differs from wallet total {:.2} on {}",
                head.total_staked, total, head.date
            );
        }
        series.refresh_summary();

        store.save_series(&series).await?;
        info!(
            "Wrote {} series entries ({} to {})",
            series.summary.total_records,
            series.summary.oldest_date.map(|d| d.to_string()).unwrap_or_default(),
            series.summary.latest_date.map(|d| d.to_string()).unwrap_or_default()
        );
    }

    Ok(())
}
