//! Stake and withdraw history of a single wallet, e.g. the crank

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use stakewatch_common::{
    config::PagingConfig,
    helius::TransactionSource,
    types::FeedTransaction,
    utils::{date_of_timestamp, format_timestamp},
};
use tracing::{info, warn};

use crate::{
    amount::AmountExtractor,
    analyzer::{Analyzer, TransactionKind},
    classifier::ActionKind,
    pipeline::{paginate, PageVerdict, PaginationReport, StopReason},
    Result,
};

/// Give up after this many pages without a single interaction.
pub const MAX_FRUITLESS_PAGES: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InteractionAction {
    Stake,
    Withdraw,
}

impl InteractionAction {
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionAction::Stake => "STAKE",
            InteractionAction::Withdraw => "WITHDRAW",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub signature: String,
    pub timestamp: i64,
    pub date: NaiveDate,
    pub date_time: String,
    pub action_type: InteractionAction,
    pub amount: f64,
    pub formatted_amount: String,
    pub transaction_type: TransactionKind,
    pub instructions: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionSummary {
    pub first_interaction: Option<Interaction>,
    pub last_interaction: Option<Interaction>,
    pub total_staked: f64,
    pub total_withdrawn: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionReport {
    pub wallet_address: String,
    pub search_date: DateTime<Utc>,
    pub total_interactions: usize,
    pub summary: InteractionSummary,
    /// Newest first
    pub interactions: Vec<Interaction>,
}

/// Collects staking interactions paid for by one wallet.
pub struct InteractionScanner {
    wallet: String,
    analyzer: Analyzer,
    extractor: AmountExtractor,
    interactions: Vec<Interaction>,
    examined: u64,
}

impl InteractionScanner {
    pub fn new(wallet: impl Into<String>, analyzer: Analyzer, extractor: AmountExtractor) -> Self {
        Self {
            wallet: wallet.into(),
            analyzer,
            extractor,
            interactions: Vec::new(),
            examined: 0,
        }
    }

    pub fn wallet(&self) -> &str {
        &self.wallet
    }

    /// Records the transaction if the wallet paid for a stake or withdraw.
    pub fn process(&mut self, transaction: &FeedTransaction) -> bool {
        self.examined += 1;
        if transaction.payer() != Some(self.wallet.as_str()) {
            return false;
        }

        let analysis = self.analyzer.analyze(transaction);
        if analysis.kind == TransactionKind::Unknown || analysis.actions.is_empty() {
            return false;
        }
        let amount = self.extractor.extract(&transaction.token_transfers);
        if amount <= 0.0 {
            return false;
        }

        // A stake anywhere in the relevant actions wins over withdraws
        let action_type = if analysis.actions.iter().any(|a| a.kind == ActionKind::Stake) {
            InteractionAction::Stake
        } else if analysis.actions.iter().any(|a| a.kind.is_withdraw()) {
            InteractionAction::Withdraw
        } else {
            return false;
        };
        let Some(date) = date_of_timestamp(transaction.timestamp) else {
            return false;
        };

        self.interactions.push(Interaction {
            signature: transaction.signature.clone(),
            timestamp: transaction.timestamp,
            date,
            date_time: format_timestamp(transaction.timestamp),
            action_type,
            amount,
            formatted_amount: format_amount(amount),
            transaction_type: analysis.kind,
            instructions: analysis.actions.iter().map(|a| a.kind.instruction_name()).collect(),
        });
        true
    }

    pub fn interaction_count(&self) -> usize {
        self.interactions.len()
    }

    pub fn examined(&self) -> u64 {
        self.examined
    }

    pub fn into_report(mut self, searched_at: DateTime<Utc>) -> InteractionReport {
        self.interactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let total_for = |action: InteractionAction| -> f64 {
            self.interactions
                .iter()
                .filter(|i| i.action_type == action)
                .map(|i| i.amount)
                .sum()
        };
        let summary = InteractionSummary {
            first_interaction: self.interactions.last().cloned(),
            last_interaction: self.interactions.first().cloned(),
            total_staked: total_for(InteractionAction::Stake),
            total_withdrawn: total_for(InteractionAction::Withdraw),
        };

        InteractionReport {
            wallet_address: self.wallet,
            search_date: searched_at,
            total_interactions: self.interactions.len(),
            summary,
            interactions: self.interactions,
        }
    }
}

/// Walks the wallet's whole history, or until [`MAX_FRUITLESS_PAGES`] pages
/// turned up nothing.
pub async fn scan_wallet(
    source: &dyn TransactionSource,
    paging: &PagingConfig,
    scanner: &mut InteractionScanner,
) -> Result<PaginationReport> {
    let wallet = scanner.wallet().to_string();
    let mut pages = 0u32;

    paginate(source, &wallet, paging, |page| {
        for transaction in page {
            scanner.process(transaction);
        }
        pages += 1;

        let oldest = page.last().and_then(|tx| date_of_timestamp(tx.timestamp));
        info!(
            "Batch {}: {} transactions, oldest: {}, staking interactions found: {}",
            pages,
            page.len(),
            oldest.map_or_else(|| "N/A".to_string(), |d| d.to_string()),
            scanner.interaction_count()
        );

        if pages > MAX_FRUITLESS_PAGES && scanner.interaction_count() == 0 {
            warn!("Searched {} batches with no staking interactions, stopping", pages);
            return PageVerdict::Stop(StopReason::Done);
        }
        PageVerdict::Continue
    })
    .await
}

/// `1234567.891` -> `1,234,567.89`
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}
