use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use stakewatch_aggregator::{
    interactions::{scan_wallet, InteractionReport, InteractionScanner},
    AmountExtractor, Analyzer, Classifier,
};
use stakewatch_common::{
    config::{PagingConfig, UpdaterConfig},
    helius::HeliusClient,
    programs::CRANK_WALLET,
};
use std::path::PathBuf;
use tracing::info;

/// Lists every stake and withdraw a wallet paid for on the Jupiter staking program
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Helius API key
    #[arg(long, env = "HELIUS_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Wallet to search; defaults to the staking crank
    #[arg(long, default_value = CRANK_WALLET)]
    wallet: String,

    /// JSON configuration file for programs, mint and retry settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pause between pages in milliseconds
    #[arg(long, default_value_t = 300)]
    page_delay_ms: u64,

    /// Report file; defaults to crank_interactions_<date>.json
    #[arg(long)]
    output: Option<PathBuf>,
}

fn print_interactions(report: &InteractionReport) {
    println!(
        "{:<12} {:<10} {:<9} {:>15} {:<15} Signature",
        "Date", "Time", "Action", "Amount", "Type"
    );
    println!("{}", "-".repeat(100));
    for interaction in &report.interactions {
        let time = interaction.date_time.split(' ').nth(1).unwrap_or_default();
        let signature: String = interaction.signature.chars().take(20).collect();
        println!(
            "{:<12} {:<10} {:<9} {:>15} {:<15} {}...",
            interaction.date.to_string(),
            time,
            interaction.action_type.as_str(),
            interaction.formatted_amount,
            interaction.transaction_type.as_str(),
            signature
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => UpdaterConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => UpdaterConfig::default(),
    };
    config.helius.api_key = args.api_key.clone();

    let client = HeliusClient::new(config.helius.clone(), config.retry.clone());
    let paging = PagingConfig {
        page_delay_ms: args.page_delay_ms,
        ..config.paging.clone()
    };
    let programs = &config.programs;
    let mut scanner = InteractionScanner::new(
        args.wallet.as_str(),
        Analyzer::new(
            Classifier::new(programs.staking_program.as_str()),
            programs.distributor_program.as_str(),
        ),
        AmountExtractor::new(programs.token_mint.as_str(), config.amount_policy),
    );

    info!("Searching for all {} interactions with Jupiter staking", args.wallet);
    let pagination = scan_wallet(&client, &paging, &mut scanner)
        .await
        .context("Interaction search failed")?;
    info!(
        "Examined {} transactions in {} batches ({:?})",
        scanner.examined(),
        pagination.pages,
        pagination.stop_reason
    );

    let searched_at = Utc::now();
    let report = scanner.into_report(searched_at);

    info!("Total staking interactions: {}", report.total_interactions);
    if let (Some(first), Some(last)) = (&report.summary.first_interaction, &report.summary.last_interaction) {
        info!("First interaction: {} ({} {} JUP)", first.date_time, first.action_type.as_str(), first.formatted_amount);
        info!("Last interaction:  {} ({} {} JUP)", last.date_time, last.action_type.as_str(), last.formatted_amount);
        info!(
            "Staked {:.2}, withdrawn {:.2}, net {:.2} JUP",
            report.summary.total_staked,
            report.summary.total_withdrawn,
            report.summary.total_staked - report.summary.total_withdrawn
        );
        info!("Consider adjusting stats from {} onwards", first.date);
    }
    print_interactions(&report);

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("crank_interactions_{}.json", searched_at.format("%Y-%m-%d"))));
    tokio::fs::write(&output, serde_json::to_string_pretty(&report)?)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Results saved to {}", output.display());

    Ok(())
}
