//! Common data types used throughout the stakewatch tools

pub mod helius;
pub mod state;

pub use helius::{AccountKey, FeedInstruction, FeedTransaction, TokenTransfer};
pub use state::{CumulativeSeries, SeriesEntry, SeriesSummary, WalletSnapshot};
