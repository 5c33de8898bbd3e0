//! Maps staking-program instruction payloads to semantic actions

use serde::Serialize;
use stakewatch_common::types::FeedInstruction;

/// What a single staking-program instruction does to a wallet's locked balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionKind {
    /// `increaseLockedAmount`
    Stake,
    /// `withdraw`
    Withdraw,
    /// `withdrawPartialUnstaking`
    WithdrawPartial,
    /// `toggleMaxLock`
    ToggleLock,
    Unknown,
}

impl ActionKind {
    pub fn is_withdraw(self) -> bool {
        matches!(self, ActionKind::Withdraw | ActionKind::WithdrawPartial)
    }

    /// Instruction name as the program's IDL spells it
    pub fn instruction_name(self) -> &'static str {
        match self {
            ActionKind::Stake => "increaseLockedAmount",
            ActionKind::Withdraw => "withdraw",
            ActionKind::WithdrawPartial => "withdrawPartialUnstaking",
            ActionKind::ToggleLock => "toggleMaxLock",
            ActionKind::Unknown => "unknown",
        }
    }
}

/// Length of the truncated payload keys
pub const PREFIX_LEN: usize = 6;

/// Base58 payload keys. The feed carries either the full discriminator-only
/// payload or a longer one sharing its first six characters.
const PAYLOAD_PATTERNS: &[(&str, ActionKind)] = &[
    ("akdNKvmXxTg", ActionKind::WithdrawPartial),
    ("Xd2GMpFXgQ1", ActionKind::Withdraw),
    ("hXMy9aWmoGcFwgKCTXYVV", ActionKind::Stake),
    ("35nv67PJjDCyd", ActionKind::ToggleLock),
    ("akdNKv", ActionKind::WithdrawPartial),
    ("Xd2GMp", ActionKind::Withdraw),
    ("hXMy9a", ActionKind::Stake),
    ("35nv67", ActionKind::ToggleLock),
];

#[derive(Debug, Clone)]
pub struct Classifier {
    staking_program: String,
}

impl Classifier {
    pub fn new(staking_program: impl Into<String>) -> Self {
        Self {
            staking_program: staking_program.into(),
        }
    }

    pub fn staking_program(&self) -> &str {
        &self.staking_program
    }

    /// `None` when the instruction belongs to another program.
    pub fn classify(&self, instruction: &FeedInstruction) -> Option<ActionKind> {
        if instruction.program_id != self.staking_program {
            return None;
        }
        Some(classify_payload(&instruction.data))
    }
}

/// Exact match against every key first, then the first [`PREFIX_LEN`]
/// characters against every key.
pub fn classify_payload(data: &str) -> ActionKind {
    if let Some((_, kind)) = PAYLOAD_PATTERNS.iter().find(|(key, _)| *key == data) {
        return *kind;
    }

    // base58 is ASCII; anything else cannot match a key
    let prefix = match data.get(..PREFIX_LEN) {
        Some(prefix) => prefix,
        None => return ActionKind::Unknown,
    };
    PAYLOAD_PATTERNS
        .iter()
        .find(|(key, _)| *key == prefix)
        .map(|(_, kind)| *kind)
        .unwrap_or(ActionKind::Unknown)
}
