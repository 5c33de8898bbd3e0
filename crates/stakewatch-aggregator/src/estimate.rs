//! Approximate active-wallet counts for runs without a wallet snapshot.
//!
//! The estimate drifts from the real count and is only used when exact
//! wallet state cannot be loaded. Each day with activity moves the count by
//! a tenth of that day's active wallets plus one wallet per 10M net tokens
//! (only when the net change exceeds 1M), and never drops it by more than 1%
//! in a day.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::daily::DailyAggregate;

const LARGE_MOVE_THRESHOLD: f64 = 1_000_000.0;
const TOKENS_PER_WALLET: f64 = 10_000_000.0;
const NEW_WALLET_RATIO: f64 = 0.1;
const MAX_DAILY_DECLINE: f64 = 0.01;

/// Rounds halves toward positive infinity.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Count for every delta date, applied oldest first from `latest_active`.
pub fn estimate_wallet_counts(latest_active: u64, deltas: &[DailyAggregate]) -> BTreeMap<NaiveDate, u64> {
    let mut ordered: Vec<&DailyAggregate> = deltas.iter().collect();
    ordered.sort_by_key(|delta| delta.date);

    let mut count = latest_active as i64;
    let mut counts = BTreeMap::new();
    for delta in ordered {
        if delta.active_wallets > 0 {
            let from_volume = if delta.net_change.abs() > LARGE_MOVE_THRESHOLD {
                round_half_up(delta.net_change / TOKENS_PER_WALLET)
            } else {
                0
            };
            let new_wallets = round_half_up(delta.active_wallets as f64 * NEW_WALLET_RATIO);
            let floor = -round_half_up(count as f64 * MAX_DAILY_DECLINE);

            count = (count + (from_volume + new_wallets).max(floor)).max(0);
        }
        counts.insert(delta.date, count as u64);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakewatch_common::utils::parse_date;

    fn delta(date: &str, net_change: f64, active_wallets: u64) -> DailyAggregate {
        DailyAggregate {
            net_change,
            active_wallets,
            ..DailyAggregate::empty(parse_date(date).unwrap())
        }
    }

    #[test]
    fn test_quiet_day_keeps_count() {
        let counts = estimate_wallet_counts(1000, &[delta("2025-07-30", 0.0, 0)]);
        assert_eq!(counts[&parse_date("2025-07-30").unwrap()], 1000);
    }

    #[test]
    fn test_small_moves_only_add_new_wallets() {
        let counts = estimate_wallet_counts(1000, &[delta("2025-07-30", 500_000.0, 25)]);
        // 25 * 0.1 = 2.5 rounds up
        assert_eq!(counts[&parse_date("2025-07-30").unwrap()], 1003);
    }

    #[test]
    fn test_large_outflow_is_clamped() {
        let counts = estimate_wallet_counts(1000, &[delta("2025-07-30", -500_000_000.0, 10)]);
        // -50 + 1 is floored at -1% of 1000
        assert_eq!(counts[&parse_date("2025-07-30").unwrap()], 990);
    }

    #[test]
    fn test_applied_in_date_order() {
        let counts = estimate_wallet_counts(
            100,
            &[delta("2025-07-31", 0.0, 40), delta("2025-07-30", 20_000_000.0, 10)],
        );
        assert_eq!(counts[&parse_date("2025-07-30").unwrap()], 103);
        assert_eq!(counts[&parse_date("2025-07-31").unwrap()], 107);
    }

    #[test]
    fn test_never_negative() {
        let counts = estimate_wallet_counts(0, &[delta("2025-07-30", -90_000_000.0, 1)]);
        assert_eq!(counts[&parse_date("2025-07-30").unwrap()], 0);
    }
}
