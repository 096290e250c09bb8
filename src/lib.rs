// Upkeep-driven raffle
// Entries accumulate in an escrow; an automation caller closes the round and
// an oracle delivers the randomness that picks and pays the winner.

pub mod constants;
pub mod error;
pub mod events;
pub mod instruction;
pub mod ledger;
pub mod processor;
pub mod settlement;
pub mod state;
pub mod upkeep;
pub mod utils;
pub mod vrf;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, msg, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    if let Err(error) = processor::Processor::process(program_id, accounts, instruction_data) {
        msg!("Raffle instruction failed: {}", error);
        return Err(error);
    }
    Ok(())
}
