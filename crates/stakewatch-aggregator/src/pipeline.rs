//! Cursor-based page loop over a [`TransactionSource`]

use serde::Serialize;
use stakewatch_common::{config::PagingConfig, helius::TransactionSource, types::FeedTransaction};
use tracing::{debug, info};

use crate::{
    daily::{DailyAggregator, Window},
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A page reached back past the window's cutoff
    CutoffReached,
    EmptyPage,
    /// `max_pages` were fetched
    PageLimit,
    /// The source handed back a page ending at the cursor it was given
    Stalled,
    /// The page callback asked to stop
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageVerdict {
    Continue,
    Stop(StopReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationReport {
    pub pages: u32,
    pub transactions: u64,
    pub stop_reason: StopReason,
    /// Cursor the next page would have been requested with
    pub last_signature: Option<String>,
}

/// Fetches pages of `address` backwards in time until `on_page` or one of
/// the built-in stop conditions ends the loop.
pub async fn paginate<F>(
    source: &dyn TransactionSource,
    address: &str,
    paging: &PagingConfig,
    mut on_page: F,
) -> Result<PaginationReport>
where
    F: FnMut(&[FeedTransaction]) -> PageVerdict,
{
    let mut before: Option<String> = None;
    let mut pages = 0u32;
    let mut transactions = 0u64;

    let stop_reason = loop {
        let page = source
            .fetch_page(address, before.as_deref(), paging.page_size)
            .await?;
        if page.is_empty() {
            break StopReason::EmptyPage;
        }

        pages += 1;
        transactions += page.len() as u64;
        debug!("Page {} of {}: {} transactions", pages, address, page.len());

        if let PageVerdict::Stop(reason) = on_page(page.as_slice()) {
            before = page.last().map(|tx| tx.signature.clone());
            break reason;
        }

        let next = page.last().map(|tx| tx.signature.clone());
        if next.is_none() || next == before {
            break StopReason::Stalled;
        }
        before = next;

        if paging.max_pages.is_some_and(|max| pages >= max) {
            break StopReason::PageLimit;
        }

        tokio::time::sleep(paging.page_delay()).await;
    };

    info!(
        "Stopped paging {} after {} pages ({} transactions): {:?}",
        address, pages, transactions, stop_reason
    );

    Ok(PaginationReport {
        pages,
        transactions,
        stop_reason,
        last_signature: before,
    })
}

/// Feeds every transaction of `address` newer than the window's cutoff into
/// `aggregator`, stopping at the first page that reaches past the cutoff.
pub async fn collect_window(
    source: &dyn TransactionSource,
    address: &str,
    paging: &PagingConfig,
    aggregator: &mut DailyAggregator,
    window: &Window,
) -> Result<PaginationReport> {
    let mut batch = 0u32;
    paginate(source, address, paging, |page| {
        batch += 1;
        let accepted = page.iter().filter(|tx| aggregator.ingest(tx, window)).count();
        info!("Batch {}: {} of {} transactions counted", batch, accepted, page.len());

        let oldest = page.iter().map(|tx| tx.timestamp).min();
        match oldest {
            Some(ts) if ts < window.cutoff_timestamp => PageVerdict::Stop(StopReason::CutoffReached),
            _ => PageVerdict::Continue,
        }
    })
    .await
}


#[cfg(test)]
mod tests {
    use super::{testing::MemorySource, *};
    use crate::{amount::AmountExtractor, analyzer::Analyzer, classifier::Classifier};
    use stakewatch_common::{
        config::AmountPolicy,
        programs::{CLAIM_STAKE_PROGRAM, JUPITER_STAKING_PROGRAM, JUP_MINT},
        types::{FeedInstruction, TokenTransfer},
        utils::{parse_date, start_of_day},
    };

    fn paging(page_size: u32, max_pages: Option<u32>) -> PagingConfig {
        PagingConfig {
            page_size,
            page_delay_ms: 0,
            max_pages,
        }
    }

    fn stake(signature: &str, timestamp: i64, amount: f64) -> FeedTransaction {
        FeedTransaction {
            signature: signature.to_string(),
            timestamp,
            fee_payer: Some("W1".to_string()),
            account_keys: None,
            instructions: vec![FeedInstruction {
                program_id: JUPITER_STAKING_PROGRAM.to_string(),
                data: "hXMy9aWmoGcFwgKCTXYVV".to_string(),
                inner_instructions: vec![],
            }],
            token_transfers: vec![TokenTransfer {
                mint: JUP_MINT.to_string(),
                token_amount: Some(amount),
            }],
        }
    }

    fn feed(count: i64, first_ts: i64, step: i64) -> Vec<FeedTransaction> {
        (0..count)
            .map(|i| stake(&format!("sig{i}"), first_ts + i * step, 1.0))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_page_stops() {
        let source = MemorySource::new(feed(5, 1_000, 10));
        let report = paginate(&source, "addr", &paging(2, None), |_| PageVerdict::Continue)
            .await
            .unwrap();

        assert_eq!(report.pages, 3);
        assert_eq!(report.transactions, 5);
        assert_eq!(report.stop_reason, StopReason::EmptyPage);
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test]
    async fn test_page_limit_stops() {
        let source = MemorySource::new(feed(50, 1_000, 10));
        let report = paginate(&source, "addr", &paging(10, Some(2)), |_| PageVerdict::Continue)
            .await
            .unwrap();

        assert_eq!(report.pages, 2);
        assert_eq!(report.stop_reason, StopReason::PageLimit);
        assert_eq!(report.last_signature.as_deref(), Some("sig30"));
    }

    #[tokio::test]
    async fn test_collect_window_stops_at_cutoff() {
        let start = start_of_day(parse_date("2025-07-30").unwrap());
        // 20 transactions an hour apart straddling the cutoff, newest last
        let source = MemorySource::new(feed(20, start - 10 * 3_600, 3_600));
        let window = Window::new(parse_date("2025-07-30").unwrap(), parse_date("2025-07-30").unwrap());
        let mut aggregator = DailyAggregator::new(
            Analyzer::new(Classifier::new(JUPITER_STAKING_PROGRAM), CLAIM_STAKE_PROGRAM),
            AmountExtractor::new(JUP_MINT, AmountPolicy::Sum),
        );

        let report = collect_window(&source, JUPITER_STAKING_PROGRAM, &paging(4, None), &mut aggregator, &window)
            .await
            .unwrap();

        assert_eq!(report.stop_reason, StopReason::CutoffReached);
        assert_eq!(report.pages, 3);
        assert_eq!(aggregator.stats().accepted, 10);
        assert_eq!(aggregator.stats().before_cutoff, 2);
        assert_eq!(aggregator.daily_changes()[0].staked, 10.0);
    }
}
