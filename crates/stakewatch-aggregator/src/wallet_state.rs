//! Per-wallet staked balances, the source of truth for the active wallet count

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use stakewatch_common::types::WalletSnapshot;

use crate::{AggregatorError, Result};

/// Balances at or below this are treated as fully withdrawn.
pub const BALANCE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct WalletStateStore {
    as_of: NaiveDate,
    balances: HashMap<String, f64>,
    excluded: HashSet<String>,
}

impl WalletStateStore {
    /// Validates a persisted snapshot. Dust balances are dropped on load.
    pub fn load(snapshot: WalletSnapshot) -> Result<Self> {
        let mut balances = HashMap::with_capacity(snapshot.wallets.len());
        for (wallet, balance) in snapshot.wallets {
            if wallet.trim().is_empty() {
                return Err(AggregatorError::StateLoad("wallet snapshot has an empty address".to_string()));
            }
            if !balance.is_finite() || balance < 0.0 {
                return Err(AggregatorError::StateLoad(format!(
                    "wallet {wallet} has invalid balance {balance}"
                )));
            }
            if balance > BALANCE_EPSILON {
                balances.insert(wallet, balance);
            }
        }

        Ok(Self {
            as_of: snapshot.as_of_date,
            balances,
            excluded: HashSet::new(),
        })
    }

    /// Wallets that are never tracked or persisted.
    ///
    /// Excluded wallets are dropped from the balances here, so they never
    /// count towards [`active_count`](Self::active_count) either.
    pub fn with_exclusions<I, S>(mut self, wallets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(wallets.into_iter().map(Into::into));
        let excluded = &self.excluded;
        self.balances.retain(|wallet, _| !excluded.contains(wallet));
        self
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn apply(&mut self, wallet: &str, delta: f64) {
        if self.excluded.contains(wallet) {
            return;
        }
        let balance = self.balances.get(wallet).copied().unwrap_or(0.0) + delta;
        if balance <= BALANCE_EPSILON {
            self.balances.remove(wallet);
        } else {
            self.balances.insert(wallet.to_string(), balance);
        }
    }

    pub fn balance(&self, wallet: &str) -> Option<f64> {
        self.balances.get(wallet).copied()
    }

    pub fn balances(&self) -> &HashMap<String, f64> {
        &self.balances
    }

    pub fn active_count(&self) -> usize {
        self.balances.len()
    }

    pub fn total_staked(&self) -> f64 {
        self.balances.values().sum()
    }

    pub fn snapshot(&self, as_of_date: NaiveDate) -> WalletSnapshot {
        let wallets: BTreeMap<String, f64> = self
            .balances
            .iter()
            .map(|(wallet, balance)| (wallet.clone(), *balance))
            .collect();

        WalletSnapshot { as_of_date, wallets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakewatch_common::utils::parse_date;

    fn store(wallets: &[(&str, f64)]) -> WalletStateStore {
        WalletStateStore::load(WalletSnapshot {
            as_of_date: parse_date("2025-07-29").unwrap(),
            wallets: wallets.iter().map(|(w, b)| (w.to_string(), *b)).collect(),
        })
        .unwrap()
    }

    #[test]
    fn test_apply_creates_and_updates() {
        let mut wallets = store(&[("W1", 500.0)]);
        wallets.apply("W1", 250.0);
        wallets.apply("W2", 10.0);

        assert_eq!(wallets.balance("W1"), Some(750.0));
        assert_eq!(wallets.balance("W2"), Some(10.0));
        assert_eq!(wallets.active_count(), 2);
    }

    #[test]
    fn test_decay_below_epsilon_removes_wallet() {
        let mut wallets = store(&[("W1", 100.0), ("W2", 5.0)]);
        wallets.apply("W1", -(100.0 - 1e-10));

        assert_eq!(wallets.balance("W1"), None);
        assert_eq!(wallets.active_count(), 1);
    }

    #[test]
    fn test_withdraw_from_unseen_wallet_is_not_kept() {
        let mut wallets = store(&[]);
        wallets.apply("W9", -3.0);
        assert_eq!(wallets.active_count(), 0);
    }

    #[test]
    fn test_load_drops_dust_and_rejects_garbage() {
        assert_eq!(store(&[("W1", 1.0), ("W2", 0.0000005)]).active_count(), 1);

        let negative = WalletStateStore::load(WalletSnapshot {
            as_of_date: parse_date("2025-07-29").unwrap(),
            wallets: BTreeMap::from([("W1".to_string(), -1.0)]),
        });
        assert!(matches!(negative, Err(AggregatorError::StateLoad(_))));

        let nan = WalletStateStore::load(WalletSnapshot {
            as_of_date: parse_date("2025-07-29").unwrap(),
            wallets: BTreeMap::from([("W1".to_string(), f64::NAN)]),
        });
        assert!(matches!(nan, Err(AggregatorError::StateLoad(_))));
    }

    #[test]
    fn test_excluded_wallets_are_never_tracked() {
        let mut wallets = store(&[("W1", 1.0), ("crank", 2.0)]).with_exclusions(["crank"]);
        wallets.apply("crank", 5.0);
        let snapshot = wallets.snapshot(parse_date("2025-07-30").unwrap());

        assert_eq!(snapshot.as_of_date, parse_date("2025-07-30").unwrap());
        assert_eq!(snapshot.wallets.len(), 1);
        assert!(snapshot.wallets.contains_key("W1"));
        assert_eq!(wallets.active_count(), 1);
    }
}
