use serde::{Deserialize, Serialize};

/// One record of the Helius enhanced transactions feed.
///
/// Only the fields the staking aggregation reads are modelled; everything else
/// in the payload is ignored on deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedTransaction {
    pub signature: String,
    /// Block time in unix seconds
    pub timestamp: i64,
    #[serde(default)]
    pub fee_payer: Option<String>,
    #[serde(default)]
    pub account_keys: Option<Vec<AccountKey>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub instructions: Vec<FeedInstruction>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub token_transfers: Vec<TokenTransfer>,
}

impl FeedTransaction {
    /// The wallet a transaction is attributed to: the fee payer, or the first
    /// account key when the payer is missing.
    pub fn payer(&self) -> Option<&str> {
        self.fee_payer
            .as_deref()
            .filter(|payer| !payer.is_empty())
            .or_else(|| {
                self.account_keys
                    .as_ref()
                    .and_then(|keys| keys.first())
                    .map(|key| key.pubkey.as_str())
            })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountKey {
    pub pubkey: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedInstruction {
    pub program_id: String,
    /// Base58 instruction payload
    #[serde(default)]
    pub data: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub inner_instructions: Vec<FeedInstruction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    pub mint: String,
    /// UI amount (already scaled by the mint decimals)
    #[serde(default)]
    pub token_amount: Option<f64>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
