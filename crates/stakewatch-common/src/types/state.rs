//! Persisted state: the wallet snapshot and the cumulative staking series

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Staked balance per wallet as of the close of `as_of_date`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletSnapshot {
    pub as_of_date: NaiveDate,
    pub wallets: BTreeMap<String, f64>,
}

/// Derived metadata over [`CumulativeSeries::daily_data`].
///
/// Fields are optional on the wire so that a hand-edited or truncated file
/// still parses; the merge engine rejects a summary missing its baseline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SeriesSummary {
    pub total_records: usize,
    pub latest_date: Option<NaiveDate>,
    pub latest_total_staked: Option<f64>,
    pub latest_active_wallets: Option<u64>,
    pub oldest_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeriesEntry {
    pub date: NaiveDate,
    /// Cumulative staked amount at the close of `date`
    pub total_staked: f64,
    #[serde(default)]
    pub active_wallets: Option<u64>,
}

/// Long-lived daily history, newest entry first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeSeries {
    #[serde(default)]
    pub summary: SeriesSummary,
    #[serde(default)]
    pub daily_data: Vec<SeriesEntry>,
}

impl CumulativeSeries {
    /// Builds a series from entries in any order, sorting newest first.
    pub fn from_entries(mut entries: Vec<SeriesEntry>) -> Self {
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        let mut series = Self {
            summary: SeriesSummary::default(),
            daily_data: entries,
        };
        series.refresh_summary();
        series
    }

    /// Recomputes the summary from the head and tail of `daily_data`.
    pub fn refresh_summary(&mut self) {
        let head = self.daily_data.first();
        self.summary = SeriesSummary {
            total_records: self.daily_data.len(),
            latest_date: head.map(|entry| entry.date),
            latest_total_staked: head.map(|entry| entry.total_staked),
            latest_active_wallets: head.and_then(|entry| entry.active_wallets),
            oldest_date: self.daily_data.last().map(|entry| entry.date),
        };
    }

    pub fn latest(&self) -> Option<&SeriesEntry> {
        self.daily_data.first()
    }
}
