//! Folds daily deltas into the persisted cumulative series

use std::collections::BTreeMap;

use chrono::NaiveDate;
use stakewatch_common::types::{CumulativeSeries, SeriesEntry};

use crate::{daily::DailyAggregate, AggregatorError, Result};

/// Where merged entries take their active-wallet count from.
#[derive(Debug, Clone)]
pub enum ActiveWalletSource {
    /// Live wallet-state count, stamped on every new entry
    Live(u64),
    /// One count per delta date, e.g. from the estimator
    PerDate(BTreeMap<NaiveDate, u64>),
    Unavailable,
}

impl ActiveWalletSource {
    fn count_for(&self, date: NaiveDate) -> Option<u64> {
        match self {
            ActiveWalletSource::Live(count) => Some(*count),
            ActiveWalletSource::PerDate(counts) => counts.get(&date).copied(),
            ActiveWalletSource::Unavailable => None,
        }
    }
}

/// Applies `deltas` oldest first on top of `existing`, starting from its
/// latest cumulative total.
///
/// The result holds one entry per date, newest first. When a date occurs
/// more than once the entry with the larger total wins.
pub fn merge(
    existing: &CumulativeSeries,
    deltas: &[DailyAggregate],
    wallets: &ActiveWalletSource,
) -> Result<CumulativeSeries> {
    if existing.daily_data.is_empty() {
        return Err(AggregatorError::Merge("existing series has no entries".to_string()));
    }
    if existing.summary.latest_date.is_none() {
        return Err(AggregatorError::Merge("series summary has no latestDate".to_string()));
    }
    let mut running = existing
        .summary
        .latest_total_staked
        .ok_or_else(|| AggregatorError::Merge("series summary has no latestTotalStaked".to_string()))?;

    let mut ordered: Vec<&DailyAggregate> = deltas.iter().collect();
    ordered.sort_by_key(|delta| delta.date);

    let mut entries = Vec::with_capacity(existing.daily_data.len() + ordered.len());
    for delta in ordered {
        running += delta.net_change;
        entries.push(SeriesEntry {
            date: delta.date,
            total_staked: running,
            active_wallets: wallets.count_for(delta.date),
        });
    }
    entries.reverse();
    entries.extend(existing.daily_data.iter().cloned());

    let mut by_date: BTreeMap<NaiveDate, SeriesEntry> = BTreeMap::new();
    for entry in entries {
        match by_date.get(&entry.date) {
            Some(kept) if kept.total_staked >= entry.total_staked => {}
            _ => {
                by_date.insert(entry.date, entry);
            }
        }
    }

    let mut merged = CumulativeSeries {
        summary: existing.summary.clone(),
        daily_data: by_date.into_values().rev().collect(),
    };
    merged.refresh_summary();
    Ok(merged)
}
