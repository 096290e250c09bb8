// Randomness request and fulfillment handshake with the oracle
use solana_program::{clock::UnixTimestamp, msg};

use crate::{
    constants::{MAX_CALLBACK_COMPUTE_UNITS, MAX_NUM_WORDS, NUM_WORDS, REQUEST_CONFIRMATIONS},
    error::RaffleError,
    events::RaffleEvent,
    settlement::FundTransfer,
    state::{RaffleConfig, RaffleState, RequestId, Round},
    utils::RandomWord,
};

/// Parameters forwarded to the oracle with every request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomnessRequest {
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub minimum_confirmations: u16,
    pub callback_compute_limit: u32,
    pub num_words: u32,
    /// Requests issued before this one
    pub nonce: u64,
}

impl RandomnessRequest {
    pub fn for_round(config: &RaffleConfig, round: &Round) -> Self {
        Self {
            key_hash: config.key_hash,
            subscription_id: config.subscription_id,
            minimum_confirmations: REQUEST_CONFIRMATIONS,
            callback_compute_limit: config.callback_compute_limit,
            num_words: NUM_WORDS,
            nonce: round.request_nonce,
        }
    }
}

/// The external randomness oracle, seen from the raffle
pub trait RandomnessOracle {
    /// Submits a request and returns the id its fulfillment will carry
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<RequestId, RaffleError>;
}

/// Coordinator used on-chain: validates the request and publishes it as a
/// `RandomnessRequested` log event for the off-chain oracle to serve.
#[derive(Debug, Default)]
pub struct LogCoordinator {
    pub published: Option<RaffleEvent>,
}

impl RandomnessOracle for LogCoordinator {
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<RequestId, RaffleError> {
        if request.num_words == 0 || request.num_words > MAX_NUM_WORDS {
            msg!("Oracle rejected request: {} words", request.num_words);
            return Err(RaffleError::RequestFailed);
        }
        if request.callback_compute_limit > MAX_CALLBACK_COMPUTE_UNITS {
            msg!(
                "Oracle rejected request: callback limit {} above {}",
                request.callback_compute_limit,
                MAX_CALLBACK_COMPUTE_UNITS
            );
            return Err(RaffleError::RequestFailed);
        }
        let request_id = request
            .nonce
            .checked_add(1)
            .map(RequestId)
            .ok_or(RaffleError::RequestFailed)?;

        self.published = Some(RaffleEvent::RandomnessRequested {
            request_id,
            key_hash: request.key_hash,
            subscription_id: request.subscription_id,
            minimum_confirmations: request.minimum_confirmations,
            callback_compute_limit: request.callback_compute_limit,
            num_words: request.num_words,
        });
        Ok(request_id)
    }
}

impl Round {
    /// Closes the round and asks the oracle for randomness.
    ///
    /// Eligibility is evaluated again here; a caller's earlier
    /// `check_upkeep` may be stale. The round only moves to `Calculating`
    /// once the oracle has accepted the request.
    pub fn perform_upkeep<O: RandomnessOracle>(
        &mut self,
        config: &RaffleConfig,
        now: UnixTimestamp,
        oracle: &mut O,
    ) -> Result<RaffleEvent, RaffleError> {
        let check = self.check_upkeep(config, now);
        if !check.upkeep_needed {
            msg!(
                "Upkeep not needed: balance={}, players={}, state={}",
                self.escrowed_balance,
                self.players.len(),
                u8::from(self.state)
            );
            return Err(RaffleError::UpkeepNotNeeded);
        }

        let request = RandomnessRequest::for_round(config, self);
        let request_id = oracle.request_random_words(&request)?;
        let request_nonce = self
            .request_nonce
            .checked_add(1)
            .ok_or(RaffleError::RequestFailed)?;

        self.state = RaffleState::Calculating;
        self.outstanding_request = Some(request_id);
        self.request_nonce = request_nonce;

        msg!("Requested random words, request id {}", request_id.0);
        Ok(RaffleEvent::RequestIssued { request_id })
    }

    /// Oracle callback. Accepted only for the outstanding request; the slot
    /// is cleared on acceptance so a redelivery is refused.
    pub fn fulfill_random_words<T: FundTransfer>(
        &mut self,
        request_id: RequestId,
        random_words: &[RandomWord],
        now: UnixTimestamp,
        payout: &mut T,
    ) -> Result<RaffleEvent, RaffleError> {
        if self.outstanding_request != Some(request_id) {
            msg!("Nonexistent request {}", request_id.0);
            return Err(RaffleError::UnrecognizedRequest);
        }
        let word = random_words.first().ok_or(RaffleError::EmptyRandomWords)?;

        self.outstanding_request = None;
        self.settle(word, now, payout).map_err(|e| {
            // The oracle may redeliver once the payout can go through
            self.outstanding_request = Some(request_id);
            e
        })
    }
}
