//! Folds qualifying transactions into per-day and per-wallet sums

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use stakewatch_common::{
    types::FeedTransaction,
    utils::{date_of_timestamp, next_day, start_of_day},
};
use tracing::debug;

use crate::{
    amount::AmountExtractor,
    analyzer::{Analyzer, TransactionKind},
    classifier::ActionKind,
    wallet_state::WalletStateStore,
};

/// The span of UTC days an incremental run aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Transactions strictly before this unix timestamp are ignored
    pub cutoff_timestamp: i64,
    /// Last day counted; later days are still accumulating
    pub end_date: NaiveDate,
}

impl Window {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            cutoff_timestamp: start_of_day(start_date),
            end_date,
        }
    }

    /// Every day after `latest_date` up to and including `end_date`.
    pub fn following(latest_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self::new(next_day(latest_date), end_date)
    }

    pub fn start_date(&self) -> NaiveDate {
        date_of_timestamp(self.cutoff_timestamp).unwrap_or(self.end_date)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletActivity {
    pub staked: f64,
    pub withdrawn: f64,
    pub net_change: f64,
}

/// One day's movement. `net_change == staked - withdrawn` at all times.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub staked: f64,
    pub withdrawn: f64,
    pub net_change: f64,
    pub transaction_count: u64,
    /// Distinct wallets that moved funds that day
    pub active_wallets: u64,
}

impl DailyAggregate {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            staked: 0.0,
            withdrawn: 0.0,
            net_change: 0.0,
            transaction_count: 0,
            active_wallets: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestStats {
    pub accepted: u64,
    pub duplicates: u64,
    pub before_cutoff: u64,
    pub after_window: u64,
    pub no_payer: u64,
    pub unclassified: u64,
    /// Tracked-token amount was zero or negative
    pub zero_amount: u64,
    /// Classified, non-zero amount, but only toggle/unknown actions
    pub no_movement: u64,
    pub multiple_paths: u64,
}

#[derive(Debug, Default)]
struct DayBucket {
    staked: f64,
    withdrawn: f64,
    transaction_count: u64,
    wallets: HashMap<String, WalletActivity>,
}

impl DayBucket {
    fn net_change(&self) -> f64 {
        self.staked - self.withdrawn
    }
}

pub struct DailyAggregator {
    analyzer: Analyzer,
    extractor: AmountExtractor,
    wallets: Option<WalletStateStore>,
    seen: HashSet<String>,
    days: BTreeMap<NaiveDate, DayBucket>,
    stats: IngestStats,
}

impl DailyAggregator {
    pub fn new(analyzer: Analyzer, extractor: AmountExtractor) -> Self {
        Self {
            analyzer,
            extractor,
            wallets: None,
            seen: HashSet::new(),
            days: BTreeMap::new(),
            stats: IngestStats::default(),
        }
    }

    /// Track exact balances; every accepted transaction updates `wallets`.
    pub fn with_wallet_state(mut self, wallets: WalletStateStore) -> Self {
        self.wallets = Some(wallets);
        self
    }

    /// Returns whether the transaction moved any staked amount.
    pub fn ingest(&mut self, transaction: &FeedTransaction, window: &Window) -> bool {
        if !self.seen.insert(transaction.signature.clone()) {
            self.stats.duplicates += 1;
            return false;
        }
        if transaction.timestamp < window.cutoff_timestamp {
            self.stats.before_cutoff += 1;
            return false;
        }
        let date = match date_of_timestamp(transaction.timestamp) {
            Some(date) if date <= window.end_date => date,
            _ => {
                self.stats.after_window += 1;
                return false;
            }
        };

        // Days with program traffic appear in the output even without movement
        self.days.entry(date).or_default();

        let Some(payer) = transaction.payer() else {
            self.stats.no_payer += 1;
            return false;
        };

        let analysis = self.analyzer.analyze(transaction);
        if analysis.has_multiple_paths {
            self.stats.multiple_paths += 1;
        }
        if analysis.kind == TransactionKind::Unknown || analysis.actions.is_empty() {
            self.stats.unclassified += 1;
            return false;
        }

        let amount = self.extractor.extract(&transaction.token_transfers);
        // Also drops negative sums from signed transfer quantities
        if amount <= 0.0 {
            self.stats.zero_amount += 1;
            return false;
        }

        let mut staked = 0.0;
        let mut withdrawn = 0.0;
        for action in &analysis.actions {
            match action.kind {
                ActionKind::Stake => staked += amount,
                kind if kind.is_withdraw() => withdrawn += amount,
                _ => {}
            }
        }
        if staked == 0.0 && withdrawn == 0.0 {
            self.stats.no_movement += 1;
            return false;
        }

        let bucket = self.days.entry(date).or_default();
        bucket.staked += staked;
        bucket.withdrawn += withdrawn;
        bucket.transaction_count += 1;

        let activity = bucket.wallets.entry(payer.to_string()).or_default();
        activity.staked += staked;
        activity.withdrawn += withdrawn;
        activity.net_change = activity.staked - activity.withdrawn;

        if let Some(wallets) = self.wallets.as_mut() {
            wallets.apply(payer, staked - withdrawn);
        }

        debug!(
            "{} {} {}: +{} -{} ({})",
            date,
            transaction.signature,
            payer,
            staked,
            withdrawn,
            analysis.kind.as_str()
        );
        self.stats.accepted += 1;
        true
    }

    /// Give every day of the window an entry, so quiet days still advance the series.
    pub fn backfill(&mut self, window: &Window) {
        let mut date = window.start_date();
        while date <= window.end_date {
            self.days.entry(date).or_default();
            let next = next_day(date);
            if next == date {
                break;
            }
            date = next;
        }
    }

    /// Per-day totals, oldest first.
    pub fn daily_changes(&self) -> Vec<DailyAggregate> {
        self.days
            .iter()
            .map(|(date, bucket)| DailyAggregate {
                date: *date,
                staked: bucket.staked,
                withdrawn: bucket.withdrawn,
                net_change: bucket.net_change(),
                transaction_count: bucket.transaction_count,
                active_wallets: bucket.wallets.len() as u64,
            })
            .collect()
    }

    pub fn daily_total(&self, date: NaiveDate) -> Option<DailyAggregate> {
        self.daily_changes().into_iter().find(|d| d.date == date)
    }

    pub fn wallet_activity(&self, date: NaiveDate) -> Option<&HashMap<String, WalletActivity>> {
        self.days.get(&date).map(|bucket| &bucket.wallets)
    }

    pub fn wallet_state(&self) -> Option<&WalletStateStore> {
        self.wallets.as_ref()
    }

    pub fn active_wallet_count(&self) -> Option<usize> {
        self.wallets.as_ref().map(WalletStateStore::active_count)
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    pub fn into_wallet_state(self) -> Option<WalletStateStore> {
        self.wallets
    }
}
