use {
    crate::{csv::write_series_csv, traits::SnapshotStore, Result, StoreError},
    async_trait::async_trait,
    serde::{de::DeserializeOwned, Serialize},
    stakewatch_common::{
        config::FileConfig,
        types::{CumulativeSeries, WalletSnapshot},
    },
    std::path::{Path, PathBuf},
    tracing::{debug, info},
};

/// Pretty-printed JSON files on local disk, one per document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    series_path: PathBuf,
    wallet_path: PathBuf,
    series_csv_path: Option<PathBuf>,
}

impl JsonFileStore {
    pub fn new(series_path: impl Into<PathBuf>, wallet_path: impl Into<PathBuf>) -> Self {
        Self {
            series_path: series_path.into(),
            wallet_path: wallet_path.into(),
            series_csv_path: None,
        }
    }

    pub fn from_config(files: &FileConfig) -> Self {
        Self {
            series_path: files.series_path.clone(),
            wallet_path: files.wallet_state_path.clone(),
            series_csv_path: files.series_csv_path.clone(),
        }
    }

    /// Also write every saved series to `path` as CSV.
    pub fn with_series_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.series_csv_path = Some(path.into());
        self
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&contents).map_err(|e| StoreError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Writes through a sibling temp file so a crash never leaves a truncated document.
    async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        let body = serde_json::to_string_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn load_wallet_snapshot(&self) -> Result<WalletSnapshot> {
        Self::read_json(&self.wallet_path).await
    }

    async fn save_wallet_snapshot(&self, snapshot: &WalletSnapshot) -> Result<()> {
        Self::write_json(&self.wallet_path, snapshot).await?;
        info!(
            "Saved {} wallets as of {} to {}",
            snapshot.wallets.len(),
            snapshot.as_of_date,
            self.wallet_path.display()
        );
        Ok(())
    }

    async fn load_series(&self) -> Result<CumulativeSeries> {
        Self::read_json(&self.series_path).await
    }

    async fn save_series(&self, series: &CumulativeSeries) -> Result<()> {
        Self::write_json(&self.series_path, series).await?;
        if let Some(csv_path) = &self.series_csv_path {
            let mut body = Vec::new();
            write_series_csv(&mut body, series)?;
            tokio::fs::write(csv_path, body).await?;
            info!("CSV saved to: {}", csv_path.display());
        }
        Ok(())
    }

    async fn has_wallet_snapshot(&self) -> bool {
        tokio::fs::try_exists(&self.wallet_path).await.unwrap_or(false)
    }
}
