use stakewatch_common::{config::AmountPolicy, types::TokenTransfer};

/// Turns a transaction's token transfers into one tracked-token amount.
#[derive(Debug, Clone)]
pub struct AmountExtractor {
    mint: String,
    policy: AmountPolicy,
}

impl AmountExtractor {
    pub fn new(mint: impl Into<String>, policy: AmountPolicy) -> Self {
        Self {
            mint: mint.into(),
            policy,
        }
    }

    pub fn extract(&self, transfers: &[TokenTransfer]) -> f64 {
        let mut matching = transfers
            .iter()
            .filter(|t| t.mint == self.mint)
            .map(|t| t.token_amount.unwrap_or(0.0));

        match self.policy {
            AmountPolicy::Sum => matching.sum(),
            AmountPolicy::First => matching.next().unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakewatch_common::programs::JUP_MINT;

    const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    fn transfer(mint: &str, amount: Option<f64>) -> TokenTransfer {
        TokenTransfer {
            mint: mint.to_string(),
            token_amount: amount,
        }
    }

    fn transfers() -> Vec<TokenTransfer> {
        vec![
            transfer(USDC, Some(99.0)),
            transfer(JUP_MINT, Some(100.0)),
            transfer(JUP_MINT, None),
            transfer(JUP_MINT, Some(0.5)),
        ]
    }

    #[test]
    fn test_sums_tracked_mint_only() {
        let extractor = AmountExtractor::new(JUP_MINT, AmountPolicy::Sum);
        assert_eq!(extractor.extract(&transfers()), 100.5);
    }

    #[test]
    fn test_first_policy() {
        let extractor = AmountExtractor::new(JUP_MINT, AmountPolicy::First);
        assert_eq!(extractor.extract(&transfers()), 100.0);
    }

    #[test]
    fn test_no_matching_transfers_is_zero() {
        let extractor = AmountExtractor::new(JUP_MINT, AmountPolicy::Sum);
        assert_eq!(extractor.extract(&[]), 0.0);
        assert_eq!(extractor.extract(&[transfer(USDC, Some(1.0))]), 0.0);
    }
}
