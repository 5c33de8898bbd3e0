//! Configuration types for the stakewatch tools

use {
    std::{fs, path::{Path, PathBuf}, time::Duration},
    serde::{Deserialize, Serialize},
};

use crate::{
    errors::{Error, Result},
    programs::{CLAIM_STAKE_PROGRAM, JUPITER_STAKING_PROGRAM, JUP_MINT},
};

pub use crate::helius::HeliusConfig;

/// Top-level configuration for an incremental update run.
///
/// Every field has a default so a partial JSON file (or none at all) is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdaterConfig {
    pub helius: HeliusConfig,
    pub programs: TrackedPrograms,
    pub paging: PagingConfig,
    pub retry: RetryConfig,
    pub amount_policy: AmountPolicy,
    pub wallet_count_mode: WalletCountMode,
    /// Wallets left out of persisted wallet snapshots
    pub excluded_wallets: Vec<String>,
    pub files: FileConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackedPrograms {
    pub staking_program: String,
    pub distributor_program: String,
    pub token_mint: String,
}

impl Default for TrackedPrograms {
    fn default() -> Self {
        Self {
            staking_program: JUPITER_STAKING_PROGRAM.to_string(),
            distributor_program: CLAIM_STAKE_PROGRAM.to_string(),
            token_mint: JUP_MINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PagingConfig {
    /// Transactions per page, capped at 100 by the enhanced transactions API
    pub page_size: u32,
    /// Pause between consecutive page requests
    pub page_delay_ms: u64,
    /// Safety limit on the number of pages fetched in one run
    pub max_pages: Option<u32>,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            page_delay_ms: 100,
            max_pages: None,
        }
    }
}

impl PagingConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 2_000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryConfig {
    /// Backoff before retry number `attempt` (zero based): `min(base * 2^attempt, max)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let millis = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(millis)
    }
}

/// How the tracked-token transfers of one transaction are turned into an amount.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AmountPolicy {
    /// Sum every transfer of the tracked mint
    #[default]
    Sum,
    /// Use only the first transfer of the tracked mint
    First,
}

/// Where the active-wallet count of new series entries comes from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WalletCountMode {
    /// Replay every delta against the persisted wallet snapshot
    #[default]
    Exact,
    /// No wallet snapshot; approximate counts from daily activity
    Estimate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileConfig {
    pub series_path: PathBuf,
    pub wallet_state_path: PathBuf,
    /// When set, the updated series is also written as CSV
    pub series_csv_path: Option<PathBuf>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            series_path: PathBuf::from("jupiter_combined_staking.json"),
            wallet_state_path: PathBuf::from("wallet_states.json"),
            series_csv_path: None,
        }
    }
}

impl UpdaterConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = serde_json::from_str::<Self>(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.paging.page_size == 0 || self.paging.page_size > 100 {
            return Err(Error::Config(format!(
                "pageSize must be between 1 and 100, got {}",
                self.paging.page_size
            )));
        }
        if self.programs.staking_program.is_empty() || self.programs.token_mint.is_empty() {
            return Err(Error::Config("stakingProgram and tokenMint are required".to_string()));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(Error::Config("baseDelayMs must not exceed maxDelayMs".to_string()));
        }
        Ok(())
    }
}
