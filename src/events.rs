use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, program_error::ProgramError, pubkey::Pubkey};

use crate::state::RequestId;

/// Events written to the program log for indexers and oracles
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    Entered {
        player: Pubkey,
        player_index: u64,
    },
    /// Read by the oracle to learn what to serve
    RandomnessRequested {
        request_id: RequestId,
        key_hash: [u8; 32],
        subscription_id: u64,
        minimum_confirmations: u16,
        callback_compute_limit: u32,
        num_words: u32,
    },
    RequestIssued {
        request_id: RequestId,
    },
    WinnerPicked {
        winner: Pubkey,
    },
}

impl RaffleEvent {
    pub fn emit(&self) -> Result<(), ProgramError> {
        let data = self
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        sol_log_data(&[data.as_slice()]);
        Ok(())
    }
}
