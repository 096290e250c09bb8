use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::{
    state::RequestId,
    utils::{find_config_address, find_raffle_address, RandomWord},
};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create the config and raffle accounts and open the first round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The payer funding both accounts
    /// 1. `[writable]` The config account (PDA)
    /// 2. `[writable]` The raffle account (PDA)
    /// 3. `[]` The system program
    InitializeRaffle {
        /// Minimum lamports per entry
        entrance_fee: u64,
        /// Minimum seconds a round stays open
        interval: UnixTimestamp,
        key_hash: [u8; 32],
        subscription_id: u64,
        callback_compute_limit: u32,
        /// Oracle authority that delivers random words
        coordinator: Pubkey,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player, pays the entry and any extra rent
    /// 1. `[]` The config account
    /// 2. `[writable]` The raffle account
    /// 3. `[]` The system program
    EnterRaffle {
        /// Lamports paid, at least the entrance fee
        amount: u64,
    },

    /// Report whether the round may close, as return data
    ///
    /// Accounts expected:
    /// 0. `[]` The config account
    /// 1. `[]` The raffle account
    CheckUpkeep,

    /// Close the round and request randomness. Anyone may call this.
    ///
    /// Accounts expected:
    /// 0. `[]` The config account
    /// 1. `[writable]` The raffle account
    PerformUpkeep,

    /// Deliver random words for the outstanding request
    ///
    /// Accounts expected:
    /// 0. `[signer]` The coordinator
    /// 1. `[]` The config account
    /// 2. `[writable]` The raffle account
    /// 3. `[writable]` The winning player
    FulfillRandomWords {
        request_id: RequestId,
        random_words: Vec<RandomWord>,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| ProgramError::InvalidInstructionData)
    }

    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        self.try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }
}

/// Create initialize_raffle instruction
#[allow(clippy::too_many_arguments)]
pub fn initialize_raffle(
    program_id: &Pubkey,
    payer: &Pubkey,
    entrance_fee: u64,
    interval: UnixTimestamp,
    key_hash: [u8; 32],
    subscription_id: u64,
    callback_compute_limit: u32,
    coordinator: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::InitializeRaffle {
        entrance_fee,
        interval,
        key_hash,
        subscription_id,
        callback_compute_limit,
        coordinator: *coordinator,
    }
    .pack()?;

    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(find_config_address(program_id).0, false),
        AccountMeta::new(find_raffle_address(program_id).0, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create enter_raffle instruction
pub fn enter_raffle(
    program_id: &Pubkey,
    player: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::EnterRaffle { amount }.pack()?;

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new(find_raffle_address(program_id).0, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::CheckUpkeep.pack()?;

    let accounts = vec![
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new_readonly(find_raffle_address(program_id).0, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(program_id: &Pubkey) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::PerformUpkeep.pack()?;

    let accounts = vec![
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new(find_raffle_address(program_id).0, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    coordinator: &Pubkey,
    winner: &Pubkey,
    request_id: RequestId,
    random_words: Vec<RandomWord>,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::FulfillRandomWords {
        request_id,
        random_words,
    }
    .pack()?;

    let accounts = vec![
        AccountMeta::new_readonly(*coordinator, true),
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new(find_raffle_address(program_id).0, false),
        AccountMeta::new(*winner, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}
