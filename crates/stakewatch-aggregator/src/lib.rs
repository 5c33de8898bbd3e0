//! Incremental aggregation of Jupiter staking activity
//! Turns the staking program's transaction feed into a daily cumulative series

pub mod amount;
pub mod analyzer;
pub mod classifier;
pub mod daily;
pub mod estimate;
pub mod interactions;
pub mod merge;
pub mod pipeline;
pub mod updater;
pub mod wallet_state;

#[cfg(test)]
mod tests;

pub use amount::AmountExtractor;
pub use analyzer::{Analysis, Analyzer, TransactionKind};
pub use classifier::{ActionKind, Classifier};
pub use daily::{DailyAggregate, DailyAggregator, IngestStats, Window};
pub use merge::{merge, ActiveWalletSource};
pub use pipeline::{collect_window, paginate, PageVerdict, PaginationReport, StopReason};
pub use updater::{run_update, UpdateOutcome, UpdateReport};
pub use wallet_state::WalletStateStore;

use thiserror::Error;

/// Errors that abort an update run
#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("Failed to load prior state: {0}")]
    StateLoad(String),

    #[error("Merge rejected: {0}")]
    Merge(String),

    #[error("Pagination stopped before reaching the cutoff ({reason:?} after {pages} pages)")]
    IncompleteWindow { reason: StopReason, pages: u32 },

    #[error(transparent)]
    Source(#[from] stakewatch_common::Error),

    #[error(transparent)]
    Store(#[from] stakewatch_store::StoreError),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
