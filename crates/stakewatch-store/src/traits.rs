use {
    crate::Result,
    async_trait::async_trait,
    stakewatch_common::types::{CumulativeSeries, WalletSnapshot},
};

/// Persistence required by an incremental update run.
/// A missing document is an error: runs never start from an empty baseline.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the wallet balance snapshot
    async fn load_wallet_snapshot(&self) -> Result<WalletSnapshot>;

    /// Replace the wallet balance snapshot
    async fn save_wallet_snapshot(&self, snapshot: &WalletSnapshot) -> Result<()>;

    /// Load the cumulative series
    async fn load_series(&self) -> Result<CumulativeSeries>;

    /// Replace the cumulative series
    async fn save_series(&self, series: &CumulativeSeries) -> Result<()>;

    /// Whether a wallet snapshot exists at all
    async fn has_wallet_snapshot(&self) -> bool;
}
