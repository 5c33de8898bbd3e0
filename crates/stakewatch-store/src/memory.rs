use {
    crate::{traits::SnapshotStore, Result, StoreError},
    async_trait::async_trait,
    stakewatch_common::types::{CumulativeSeries, WalletSnapshot},
    std::{path::PathBuf, sync::Arc},
    tokio::sync::RwLock,
};

/// In-process store, used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    wallets: Arc<RwLock<Option<WalletSnapshot>>>,
    series: Arc<RwLock<Option<CumulativeSeries>>>,
}

impl MemoryStore {
    pub fn new(series: Option<CumulativeSeries>, wallets: Option<WalletSnapshot>) -> Self {
        Self {
            wallets: Arc::new(RwLock::new(wallets)),
            series: Arc::new(RwLock::new(series)),
        }
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn load_wallet_snapshot(&self) -> Result<WalletSnapshot> {
        self.wallets
            .read()
            .await
            .clone()
            .ok_or_else(|| StoreError::NotFound(PathBuf::from("memory://wallets")))
    }

    async fn save_wallet_snapshot(&self, snapshot: &WalletSnapshot) -> Result<()> {
        *self.wallets.write().await = Some(snapshot.clone());
        Ok(())
    }

    async fn load_series(&self) -> Result<CumulativeSeries> {
        self.series
            .read()
            .await
            .clone()
            .ok_or_else(|| StoreError::NotFound(PathBuf::from("memory://series")))
    }

    async fn save_series(&self, series: &CumulativeSeries) -> Result<()> {
        *self.series.write().await = Some(series.clone());
        Ok(())
    }

    async fn has_wallet_snapshot(&self) -> bool {
        self.wallets.read().await.is_some()
    }
}
