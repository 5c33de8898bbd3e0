//! Decides which staking actions of a transaction count, and at which nesting level

use serde::Serialize;
use stakewatch_common::types::FeedTransaction;

use crate::classifier::{ActionKind, Classifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Distributor claim that stakes the claimed tokens through a nested call
    ClaimAndStake,
    /// Staking program reached through another program's instruction
    InnerJupiter,
    /// Staking program called at the top level only
    DirectJupiter,
    Unknown,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::ClaimAndStake => "claim_and_stake",
            TransactionKind::InnerJupiter => "inner_jupiter",
            TransactionKind::DirectJupiter => "direct_jupiter",
            TransactionKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Direct,
    Inner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeveledAction {
    pub kind: ActionKind,
    pub level: Level,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub kind: TransactionKind,
    /// Actions at the level that counts for this kind
    pub actions: Vec<LeveledAction>,
    /// More than one structural path matched; diagnostic only
    pub has_multiple_paths: bool,
}

#[derive(Debug, Clone)]
pub struct Analyzer {
    classifier: Classifier,
    distributor_program: String,
}

impl Analyzer {
    pub fn new(classifier: Classifier, distributor_program: impl Into<String>) -> Self {
        Self {
            classifier,
            distributor_program: distributor_program.into(),
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn analyze(&self, transaction: &FeedTransaction) -> Analysis {
        let mut has_distributor = false;
        let mut has_direct = false;
        let mut has_inner = false;
        let mut found = Vec::new();

        for instruction in &transaction.instructions {
            if instruction.program_id == self.distributor_program {
                has_distributor = true;
            }
            if let Some(kind) = self.classifier.classify(instruction) {
                has_direct = true;
                found.push(LeveledAction { kind, level: Level::Direct });
            }
            for inner in &instruction.inner_instructions {
                if let Some(kind) = self.classifier.classify(inner) {
                    has_inner = true;
                    found.push(LeveledAction { kind, level: Level::Inner });
                }
            }
        }

        let (kind, level) = if has_distributor {
            (TransactionKind::ClaimAndStake, Some(Level::Inner))
        } else if has_inner && has_direct {
            (TransactionKind::InnerJupiter, Some(Level::Inner))
        } else if has_direct {
            (TransactionKind::DirectJupiter, Some(Level::Direct))
        } else if has_inner {
            (TransactionKind::InnerJupiter, Some(Level::Inner))
        } else {
            (TransactionKind::Unknown, None)
        };

        let actions = match level {
            Some(level) => found.into_iter().filter(|a| a.level == level).collect(),
            None => Vec::new(),
        };

        Analysis {
            kind,
            actions,
            has_multiple_paths: (has_distributor && has_direct) || (has_inner && has_direct),
        }
    }
}
