//! One incremental update run: load state, aggregate the new days, persist

use chrono::NaiveDate;
use serde::Serialize;
use stakewatch_common::{
    config::{UpdaterConfig, WalletCountMode},
    helius::TransactionSource,
    types::{CumulativeSeries, SeriesEntry},
    utils::Clock,
};
use stakewatch_store::SnapshotStore;
use tracing::info;

use crate::{
    amount::AmountExtractor,
    analyzer::Analyzer,
    classifier::Classifier,
    daily::{DailyAggregate, DailyAggregator, IngestStats, Window},
    estimate::estimate_wallet_counts,
    merge::{merge, ActiveWalletSource},
    pipeline::{collect_window, PaginationReport, StopReason},
    wallet_state::WalletStateStore,
    AggregatorError, Result,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub pagination: PaginationReport,
    pub stats: IngestStats,
    /// Per-day deltas that were merged, oldest first
    pub days: Vec<DailyAggregate>,
    pub latest: SeriesEntry,
    pub wallet_count_mode: WalletCountMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// The series already covers the last completed day; nothing was fetched
    UpToDate { latest_date: NaiveDate },
    Updated(UpdateReport),
}

async fn load_prior_state(
    config: &UpdaterConfig,
    store: &dyn SnapshotStore,
) -> Result<(CumulativeSeries, NaiveDate, Option<WalletStateStore>)> {
    let series = store
        .load_series()
        .await
        .map_err(|e| AggregatorError::StateLoad(format!("series: {e}")))?;
    if series.daily_data.is_empty() {
        return Err(AggregatorError::StateLoad("series has no entries".to_string()));
    }
    let latest_date = series
        .summary
        .latest_date
        .ok_or_else(|| AggregatorError::StateLoad("series summary has no latestDate".to_string()))?;

    let wallets = match config.wallet_count_mode {
        WalletCountMode::Exact => {
            if !store.has_wallet_snapshot().await {
                return Err(AggregatorError::StateLoad(
                    "no wallet snapshot; build one with stakewatch-wallet-states or run in estimate mode".to_string(),
                ));
            }
            let snapshot = store
                .load_wallet_snapshot()
                .await
                .map_err(|e| AggregatorError::StateLoad(format!("wallet snapshot: {e}")))?;
            let wallets = WalletStateStore::load(snapshot)?.with_exclusions(config.excluded_wallets.iter().cloned());
            // Deltas are applied from the series' latest date onwards
            if wallets.as_of() != latest_date {
                return Err(AggregatorError::StateLoad(format!(
                    "wallet snapshot is as of {} but the series ends at {}",
                    wallets.as_of(),
                    latest_date
                )));
            }
            Some(wallets)
        }
        WalletCountMode::Estimate => None,
    };

    Ok((series, latest_date, wallets))
}

/// Aggregates every completed day after the series' latest date and
/// persists the merged series and, in exact mode, the wallet snapshot.
///
/// Prior state is loaded and validated before anything is fetched. Nothing
/// is written unless pagination reached back to the cutoff.
pub async fn run_update(
    config: &UpdaterConfig,
    source: &dyn TransactionSource,
    store: &dyn SnapshotStore,
    clock: &dyn Clock,
) -> Result<UpdateOutcome> {
    let (series, latest_date, wallets) = load_prior_state(config, store).await?;

    let end_date = clock.last_completed_date();
    if latest_date >= end_date {
        info!("Series is up to date through {}", latest_date);
        return Ok(UpdateOutcome::UpToDate { latest_date });
    }

    let window = Window::following(latest_date, end_date);
    info!(
        "Aggregating {} through {} (cutoff timestamp {})",
        window.start_date(),
        window.end_date,
        window.cutoff_timestamp
    );

    let programs = &config.programs;
    let analyzer = Analyzer::new(
        Classifier::new(programs.staking_program.as_str()),
        programs.distributor_program.as_str(),
    );
    let mut aggregator = DailyAggregator::new(
        analyzer,
        AmountExtractor::new(programs.token_mint.as_str(), config.amount_policy),
    );
    if let Some(wallets) = wallets {
        aggregator = aggregator.with_wallet_state(wallets);
    }

    let pagination = collect_window(
        source,
        &programs.staking_program,
        &config.paging,
        &mut aggregator,
        &window,
    )
    .await?;
    match pagination.stop_reason {
        StopReason::CutoffReached | StopReason::EmptyPage => {}
        reason => {
            return Err(AggregatorError::IncompleteWindow {
                reason,
                pages: pagination.pages,
            })
        }
    }

    aggregator.backfill(&window);
    let days = aggregator.daily_changes();
    let stats = aggregator.stats().clone();
    info!("Ingest stats: {:?}", stats);

    let wallet_source = match aggregator.active_wallet_count() {
        Some(count) => ActiveWalletSource::Live(count as u64),
        None => {
            let baseline = series.summary.latest_active_wallets.unwrap_or_default();
            ActiveWalletSource::PerDate(estimate_wallet_counts(baseline, &days))
        }
    };

    let merged = merge(&series, &days, &wallet_source)?;
    let latest = merged
        .latest()
        .cloned()
        .ok_or_else(|| AggregatorError::Merge("merged series is empty".to_string()))?;

    // Snapshot first: if the series write fails, the date mismatch stops the next run
    if let Some(wallets) = aggregator.into_wallet_state() {
        store.save_wallet_snapshot(&wallets.snapshot(end_date)).await?;
        info!("Saved {} active wallets as of {}", wallets.active_count(), end_date);
    }
    store.save_series(&merged).await?;

    info!(
        "Series now ends at {} with {} staked ({:?} active wallets)",
        latest.date, latest.total_staked, latest.active_wallets
    );

    Ok(UpdateOutcome::Updated(UpdateReport {
        start_date: window.start_date(),
        end_date,
        pagination,
        stats,
        days,
        latest,
        wallet_count_mode: config.wallet_count_mode,
    }))
}
