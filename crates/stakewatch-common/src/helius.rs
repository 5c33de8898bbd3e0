use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    config::RetryConfig,
    errors::{Error, Result},
    types::helius::FeedTransaction,
};

/// Helius enhanced API endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeliusConfig {
    /// API key for Helius; normally supplied through `HELIUS_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Base URL of the enhanced transactions API
    pub base_url: String,
    /// Commitment level requested for every page
    pub commitment: String,
}

impl Default for HeliusConfig {
    fn default() -> Self {
        Self {
            api_key: "".to_string(),
            base_url: "https://api.helius.xyz".to_string(),
            commitment: "finalized".to_string(),
        }
    }
}

/// A reverse-chronological, cursor-paginated source of transactions.
///
/// `before` is the signature of the oldest transaction already seen; the page
/// returned holds strictly older transactions, newest first.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn fetch_page(&self, address: &str, before: Option<&str>, limit: u32) -> Result<Vec<FeedTransaction>>;
}

/// Helius client for the enhanced transactions API
#[derive(Debug, Clone)]
pub struct HeliusClient {
    config: HeliusConfig,
    retry: RetryConfig,
    client: reqwest::Client,
}

impl HeliusClient {
    pub fn new(config: HeliusConfig, retry: RetryConfig) -> Self {
        Self {
            config,
            retry,
            client: reqwest::Client::new(),
        }
    }

    /// Create a new Helius client with just an API key
    pub fn new_with_key(api_key: &str) -> Self {
        Self::new(
            HeliusConfig {
                api_key: api_key.to_string(),
                ..Default::default()
            },
            RetryConfig::default(),
        )
    }

    fn transactions_url(&self, address: &str) -> String {
        format!(
            "{}/v0/addresses/{}/transactions",
            self.config.base_url.trim_end_matches('/'),
            address
        )
    }

    /// One page of parsed transactions for `address`, with no retry.
    pub async fn get_transactions_by_address(
        &self,
        address: &str,
        before: Option<&str>,
        limit: u32,
    ) -> Result<Vec<FeedTransaction>> {
        let limit = limit.to_string();
        let mut query = vec![
            ("api-key", self.config.api_key.as_str()),
            ("limit", limit.as_str()),
            ("commitment", self.config.commitment.as_str()),
        ];
        if let Some(before) = before {
            query.push(("before", before));
        }

        let response = self
            .client
            .get(self.transactions_url(address))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            )));
        }

        Ok(response.json::<Vec<FeedTransaction>>().await?)
    }

    /// Like [`Self::get_transactions_by_address`], retrying failures with
    /// exponential backoff until the retry budget is spent.
    pub async fn get_transactions_with_retry(
        &self,
        address: &str,
        before: Option<&str>,
        limit: u32,
    ) -> Result<Vec<FeedTransaction>> {
        let mut attempt = 0;
        loop {
            match self.get_transactions_by_address(address, before, limit).await {
                Ok(page) => return Ok(page),
                Err(e) if attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        "Fetch for {} failed (attempt {}/{}): {}; retrying in {:?}",
                        address,
                        attempt + 1,
                        self.retry.max_retries + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("Giving up on {} after {} attempts: {}", address, attempt + 1, e);
                    return Err(Error::RetriesExhausted {
                        attempts: attempt + 1,
                        last_error: e.to_string(),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl TransactionSource for HeliusClient {
    async fn fetch_page(&self, address: &str, before: Option<&str>, limit: u32) -> Result<Vec<FeedTransaction>> {
        self.get_transactions_with_retry(address, before, limit).await
    }
}
