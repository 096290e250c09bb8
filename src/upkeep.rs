use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::clock::UnixTimestamp;

use crate::state::{RaffleConfig, RaffleState, Round};

/// Result of an upkeep check, with the condition that held or failed
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpkeepCheck {
    pub upkeep_needed: bool,
    pub is_open: bool,
    pub time_passed: bool,
    pub has_players: bool,
    pub has_balance: bool,
}

impl UpkeepCheck {
    pub fn new(is_open: bool, time_passed: bool, has_players: bool, has_balance: bool) -> Self {
        Self {
            upkeep_needed: is_open && time_passed && has_players && has_balance,
            is_open,
            time_passed,
            has_players,
            has_balance,
        }
    }
}

impl Round {
    /// Whether the round may close now. Reads state only.
    pub fn check_upkeep(&self, config: &RaffleConfig, now: UnixTimestamp) -> UpkeepCheck {
        let elapsed = now.saturating_sub(self.last_close_timestamp);
        UpkeepCheck::new(
            self.state == RaffleState::Open,
            elapsed >= config.interval,
            !self.players.is_empty(),
            self.escrowed_balance > 0,
        )
    }
}
