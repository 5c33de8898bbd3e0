//! End-to-end update runs against in-memory collaborators

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use stakewatch_common::{
        config::{PagingConfig, UpdaterConfig, WalletCountMode},
        programs::{JUPITER_STAKING_PROGRAM, JUP_MINT},
        types::{CumulativeSeries, FeedInstruction, FeedTransaction, SeriesEntry, TokenTransfer, WalletSnapshot},
        utils::{parse_date, start_of_day, FixedClock},
    };
    use async_trait::async_trait;
    use stakewatch_store::{MemoryStore, SnapshotStore, StoreError};

    use crate::{pipeline::testing::MemorySource, run_update, AggregatorError, StopReason, UpdateOutcome};

    const STAKE: &str = "hXMy9aWmoGcFwgKCTXYVV";
    const TOGGLE: &str = "35nv67PJjDCyd";

    fn config() -> UpdaterConfig {
        UpdaterConfig {
            paging: PagingConfig {
                page_size: 100,
                page_delay_ms: 0,
                max_pages: None,
            },
            ..Default::default()
        }
    }

    fn ts(date: &str, seconds: i64) -> i64 {
        start_of_day(parse_date(date).unwrap()) + seconds
    }

    fn direct(signature: &str, timestamp: i64, payer: &str, data: &str, amount: f64) -> FeedTransaction {
        FeedTransaction {
            signature: signature.to_string(),
            timestamp,
            fee_payer: Some(payer.to_string()),
            account_keys: None,
            instructions: vec![FeedInstruction {
                program_id: JUPITER_STAKING_PROGRAM.to_string(),
                data: data.to_string(),
                inner_instructions: vec![],
            }],
            token_transfers: vec![TokenTransfer {
                mint: JUP_MINT.to_string(),
                token_amount: Some(amount),
            }],
        }
    }

    fn prior_series() -> CumulativeSeries {
        CumulativeSeries::from_entries(vec![SeriesEntry {
            date: parse_date("2025-07-29").unwrap(),
            total_staked: 500.0,
            active_wallets: Some(1),
        }])
    }

    fn prior_wallets() -> WalletSnapshot {
        WalletSnapshot {
            as_of_date: parse_date("2025-07-29").unwrap(),
            wallets: BTreeMap::from([("W1".to_string(), 500.0)]),
        }
    }

    /// Persists wallet snapshots but refuses every series write
    struct SeriesWriteFails(MemoryStore);

    #[async_trait]
    impl SnapshotStore for SeriesWriteFails {
        async fn load_wallet_snapshot(&self) -> stakewatch_store::Result<WalletSnapshot> {
            self.0.load_wallet_snapshot().await
        }

        async fn save_wallet_snapshot(&self, snapshot: &WalletSnapshot) -> stakewatch_store::Result<()> {
            self.0.save_wallet_snapshot(snapshot).await
        }

        async fn load_series(&self) -> stakewatch_store::Result<CumulativeSeries> {
            self.0.load_series().await
        }

        async fn save_series(&self, _series: &CumulativeSeries) -> stakewatch_store::Result<()> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }

        async fn has_wallet_snapshot(&self) -> bool {
            self.0.has_wallet_snapshot().await
        }
    }

    fn clock() -> FixedClock {
        FixedClock(parse_date("2025-07-31").unwrap())
    }

    #[tokio::test]
    async fn test_stake_on_new_day_extends_series() {
        let store = MemoryStore::new(Some(prior_series()), Some(prior_wallets()));
        let source = MemorySource::new(vec![
            // still in progress on the run date
            direct("today", ts("2025-07-31", 60), "W2", STAKE, 99.0),
            direct("new", ts("2025-07-30", 3_600), "W1", STAKE, 250.0),
            direct("old", ts("2025-07-29", 3_600), "W1", STAKE, 500.0),
        ]);

        let UpdateOutcome::Updated(report) = run_update(&config(), &source, &store, &clock()).await.unwrap() else {
            panic!("expected an update");
        };
        assert_eq!(report.pagination.stop_reason, StopReason::CutoffReached);
        assert_eq!(report.stats.accepted, 1);
        assert_eq!(report.stats.after_window, 1);
        assert_eq!(report.stats.before_cutoff, 1);

        let series = store.load_series().await.unwrap();
        assert_eq!(
            series.daily_data[0],
            SeriesEntry {
                date: parse_date("2025-07-30").unwrap(),
                total_staked: 750.0,
                active_wallets: Some(1),
            }
        );
        assert_eq!(series.summary.latest_total_staked, Some(750.0));
        assert_eq!(series.summary.oldest_date, Some(parse_date("2025-07-29").unwrap()));
        assert_eq!(series.summary.total_records, 2);

        let wallets = store.load_wallet_snapshot().await.unwrap();
        assert_eq!(wallets.as_of_date, parse_date("2025-07-30").unwrap());
        assert_eq!(wallets.wallets.get("W1"), Some(&750.0));
        assert_eq!(wallets.wallets.len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_only_day_moves_nothing() {
        let store = MemoryStore::new(Some(prior_series()), Some(prior_wallets()));
        let source = MemorySource::new(vec![
            direct("toggle", ts("2025-07-30", 10), "W1", TOGGLE, 5.0),
            direct("old", ts("2025-07-28", 10), "W1", STAKE, 1.0),
        ]);

        let UpdateOutcome::Updated(report) = run_update(&config(), &source, &store, &clock()).await.unwrap() else {
            panic!("expected an update");
        };
        assert_eq!(report.days.len(), 1);
        assert_eq!(report.days[0].net_change, 0.0);
        assert_eq!(report.days[0].transaction_count, 0);

        let series = store.load_series().await.unwrap();
        assert_eq!(series.summary.latest_date, Some(parse_date("2025-07-30").unwrap()));
        assert_eq!(series.summary.latest_total_staked, Some(500.0));
    }

    #[tokio::test]
    async fn test_second_run_is_up_to_date() {
        let store = MemoryStore::new(Some(prior_series()), Some(prior_wallets()));
        let source = MemorySource::new(vec![direct("new", ts("2025-07-30", 1), "W1", STAKE, 250.0)]);

        run_update(&config(), &source, &store, &clock()).await.unwrap();
        let calls = source.calls();
        let outcome = run_update(&config(), &source, &store, &clock()).await.unwrap();

        assert_eq!(
            outcome,
            UpdateOutcome::UpToDate {
                latest_date: parse_date("2025-07-30").unwrap()
            }
        );
        assert_eq!(source.calls(), calls);
        assert_eq!(store.load_series().await.unwrap().daily_data.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_state_aborts_before_fetching() {
        let source = MemorySource::new(vec![direct("new", ts("2025-07-30", 1), "W1", STAKE, 250.0)]);

        let no_wallets = MemoryStore::new(Some(prior_series()), None);
        let err = run_update(&config(), &source, &no_wallets, &clock()).await.unwrap_err();
        assert!(matches!(err, AggregatorError::StateLoad(_)));

        let no_series = MemoryStore::new(None, Some(prior_wallets()));
        let err = run_update(&config(), &source, &no_series, &clock()).await.unwrap_err();
        assert!(matches!(err, AggregatorError::StateLoad(_)));

        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_estimate_mode_without_wallet_snapshot() {
        let store = MemoryStore::new(Some(prior_series()), None);
        let source = MemorySource::new(vec![direct("new", ts("2025-07-30", 1), "W1", STAKE, 250.0)]);
        let config = UpdaterConfig {
            wallet_count_mode: WalletCountMode::Estimate,
            ..config()
        };

        run_update(&config, &source, &store, &clock()).await.unwrap();

        let head = store.load_series().await.unwrap().daily_data[0].clone();
        assert_eq!(head.total_staked, 750.0);
        assert_eq!(head.active_wallets, Some(1));
        assert!(!store.has_wallet_snapshot().await);
    }

    #[tokio::test]
    async fn test_page_limit_leaves_state_untouched() {
        let store = MemoryStore::new(Some(prior_series()), Some(prior_wallets()));
        let source = MemorySource::new(
            (0..10)
                .map(|i| direct(&format!("s{i}"), ts("2025-07-30", i), "W1", STAKE, 1.0))
                .collect(),
        );
        let mut config = config();
        config.paging.page_size = 2;
        config.paging.max_pages = Some(2);

        let err = run_update(&config, &source, &store, &clock()).await.unwrap_err();
        assert!(matches!(
            err,
            AggregatorError::IncompleteWindow {
                reason: StopReason::PageLimit,
                pages: 2
            }
        ));
        assert_eq!(store.load_series().await.unwrap(), prior_series());
        assert_eq!(store.load_wallet_snapshot().await.unwrap(), prior_wallets());
    }

    #[tokio::test]
    async fn test_snapshot_older_than_series_aborts() {
        let stale = WalletSnapshot {
            as_of_date: parse_date("2025-07-27").unwrap(),
            wallets: BTreeMap::from([("W1".to_string(), 100.0)]),
        };
        let store = MemoryStore::new(Some(prior_series()), Some(stale.clone()));
        let source = MemorySource::new(vec![
            direct("late", ts("2025-07-30", 10), "W1", STAKE, 10.0),
            direct("gap", ts("2025-07-28", 10), "W2", STAKE, 400.0),
        ]);

        let err = run_update(&config(), &source, &store, &clock()).await.unwrap_err();
        assert!(matches!(err, AggregatorError::StateLoad(_)));
        assert_eq!(source.calls(), 0);
        assert_eq!(store.load_wallet_snapshot().await.unwrap(), stale);
        assert_eq!(store.load_series().await.unwrap(), prior_series());
    }

    #[tokio::test]
    async fn test_failed_series_write_blocks_next_run() {
        let store = SeriesWriteFails(MemoryStore::new(Some(prior_series()), Some(prior_wallets())));
        let source = MemorySource::new(vec![direct("new", ts("2025-07-30", 1), "W1", STAKE, 250.0)]);

        let err = run_update(&config(), &source, &store, &clock()).await.unwrap_err();
        assert!(matches!(err, AggregatorError::Store(StoreError::Io(_))));
        assert_eq!(
            store.load_wallet_snapshot().await.unwrap().as_of_date,
            parse_date("2025-07-30").unwrap()
        );

        let calls = source.calls();
        let err = run_update(&config(), &source, &store, &clock()).await.unwrap_err();
        assert!(matches!(err, AggregatorError::StateLoad(_)));
        assert_eq!(source.calls(), calls);
    }
}
