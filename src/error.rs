use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError, program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Entry paid less than the entrance fee
    #[error("Not enough lamports paid to enter the raffle")]
    InsufficientPayment,

    /// Entry attempted while a winner is being calculated
    #[error("Raffle is not open")]
    RoundNotOpen,

    /// Upkeep attempted while the round is not eligible to close
    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// The randomness coordinator rejected the request
    #[error("Randomness request failed")]
    RequestFailed,

    /// Fulfillment does not match the outstanding request
    #[error("Nonexistent request")]
    UnrecognizedRequest,

    /// Settlement found no players to pick from
    #[error("No players in the round")]
    EmptyPlayerSet,

    /// Prize payout to the winner failed
    #[error("Transfer to winner failed")]
    TransferFailed,

    #[error("Player index out of range")]
    IndexOutOfRange,

    #[error("Fulfillment carried no random words")]
    EmptyRandomWords,

    #[error("Raffle already initialized")]
    AlreadyInitialized,

    #[error("Raffle not initialized")]
    NotInitialized,

    #[error("Invalid raffle configuration")]
    InvalidConfig,

    /// Config or raffle account is not the expected program address
    #[error("Invalid raffle account")]
    InvalidRaffleAccount,

    #[error("Only the coordinator can fulfill randomness")]
    OnlyCoordinatorCanFulfill,

    /// Winner account passed to fulfillment is not the selected player
    #[error("Winner account does not match the selected player")]
    WinnerAccountMismatch,

    #[error("Arithmetic overflow")]
    Overflow,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
