use solana_program::{clock::UnixTimestamp, msg, pubkey::Pubkey};

use crate::{
    error::RaffleError,
    events::RaffleEvent,
    state::{RaffleState, Round},
    utils::{word_mod, RandomWord},
};

/// Push transfer of escrowed lamports to a recipient
pub trait FundTransfer {
    fn transfer(&mut self, recipient: &Pubkey, amount: u64) -> Result<(), RaffleError>;
}

impl Round {
    /// Picks the winner, re-arms the round and pays out.
    ///
    /// The round is reset before the transfer so the escrow cannot be paid
    /// twice. A failed transfer restores the round exactly as it was.
    pub(crate) fn settle<T: FundTransfer>(
        &mut self,
        word: &RandomWord,
        now: UnixTimestamp,
        payout: &mut T,
    ) -> Result<RaffleEvent, RaffleError> {
        // Unreachable through upkeep, which requires players
        let winner_index = word_mod(word, self.player_count()).ok_or_else(|| {
            msg!("No players to pick a winner from");
            RaffleError::EmptyPlayerSet
        })?;
        let winner = *self.player_at(winner_index)?;
        let prize = self.escrowed_balance;
        let rounds_settled = self
            .rounds_settled
            .checked_add(1)
            .ok_or(RaffleError::Overflow)?;

        let snapshot = self.clone();
        self.players.clear();
        self.escrowed_balance = 0;
        self.last_close_timestamp = now;
        self.state = RaffleState::Open;
        self.recent_winner = Some(winner);
        self.rounds_settled = rounds_settled;

        if let Err(e) = payout.transfer(&winner, prize) {
            msg!("Payout of {} lamports to {} failed: {}", prize, winner, e);
            *self = snapshot;
            return Err(RaffleError::TransferFailed);
        }

        msg!("Winner {} (slot {}) paid {} lamports", winner, winner_index, prize);
        Ok(RaffleEvent::WinnerPicked { winner })
    }
}
