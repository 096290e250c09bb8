use solana_program::{msg, pubkey::Pubkey};

use crate::{
    error::RaffleError,
    events::RaffleEvent,
    state::{RaffleConfig, RaffleState, Round},
};

impl Round {
    /// Records one entry for `player`. Repeated entries are separate slots.
    pub fn enter(
        &mut self,
        config: &RaffleConfig,
        player: Pubkey,
        paid: u64,
    ) -> Result<RaffleEvent, RaffleError> {
        if paid < config.entrance_fee {
            msg!("Paid {} lamports, entrance fee is {}", paid, config.entrance_fee);
            return Err(RaffleError::InsufficientPayment);
        }
        if self.state != RaffleState::Open {
            msg!("Raffle is calculating a winner, entries are closed");
            return Err(RaffleError::RoundNotOpen);
        }

        let escrowed_balance = self
            .escrowed_balance
            .checked_add(paid)
            .ok_or(RaffleError::Overflow)?;
        let player_index = self.player_count();

        self.players.push(player);
        self.escrowed_balance = escrowed_balance;

        Ok(RaffleEvent::Entered {
            player,
            player_index,
        })
    }

    pub fn player_at(&self, index: u64) -> Result<&Pubkey, RaffleError> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.players.get(index))
            .ok_or(RaffleError::IndexOutOfRange)
    }
}
