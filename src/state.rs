use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

/// State of the current round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Accepting entries
    Open,
    /// Randomness requested, waiting for the oracle to answer
    Calculating,
}

impl From<RaffleState> for u8 {
    fn from(state: RaffleState) -> Self {
        match state {
            RaffleState::Open => 0,
            RaffleState::Calculating => 1,
        }
    }
}

/// Opaque correlator between a randomness request and its fulfillment
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

/// Raffle configuration, fixed at initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Minimum lamports paid per entry
    pub entrance_fee: u64,
    /// Minimum seconds between round closes
    pub interval: UnixTimestamp,
    /// Oracle authority allowed to deliver random words
    pub coordinator: Pubkey,
    /// Oracle key selector, forwarded untouched with every request
    pub key_hash: [u8; 32],
    /// Oracle subscription, forwarded untouched with every request
    pub subscription_id: u64,
    /// Compute budget the oracle may spend on the fulfillment callback
    pub callback_compute_limit: u32,
    pub config_bump: u8,
    pub raffle_bump: u8,
}

impl Sealed for RaffleConfig {}

impl IsInitialized for RaffleConfig {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for RaffleConfig {
    const LEN: usize = 1 + 8 + 8 + 32 + 32 + 8 + 4 + 1 + 1;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, RaffleConfig::LEN];
        let (
            is_initialized,
            entrance_fee,
            interval,
            coordinator,
            key_hash,
            subscription_id,
            callback_compute_limit,
            config_bump,
            raffle_bump,
        ) = array_refs![src, 1, 8, 8, 32, 32, 8, 4, 1, 1];

        let is_initialized = match is_initialized {
            [0] => false,
            [1] => true,
            _ => return Err(ProgramError::InvalidAccountData),
        };

        Ok(RaffleConfig {
            is_initialized,
            entrance_fee: u64::from_le_bytes(*entrance_fee),
            interval: UnixTimestamp::from_le_bytes(*interval),
            coordinator: Pubkey::new_from_array(*coordinator),
            key_hash: *key_hash,
            subscription_id: u64::from_le_bytes(*subscription_id),
            callback_compute_limit: u32::from_le_bytes(*callback_compute_limit),
            config_bump: config_bump[0],
            raffle_bump: raffle_bump[0],
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, RaffleConfig::LEN];
        let (
            is_initialized_dst,
            entrance_fee_dst,
            interval_dst,
            coordinator_dst,
            key_hash_dst,
            subscription_id_dst,
            callback_compute_limit_dst,
            config_bump_dst,
            raffle_bump_dst,
        ) = mut_array_refs![dst, 1, 8, 8, 32, 32, 8, 4, 1, 1];

        is_initialized_dst[0] = self.is_initialized as u8;
        *entrance_fee_dst = self.entrance_fee.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
        coordinator_dst.copy_from_slice(self.coordinator.as_ref());
        *key_hash_dst = self.key_hash;
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        *callback_compute_limit_dst = self.callback_compute_limit.to_le_bytes();
        config_bump_dst[0] = self.config_bump;
        raffle_bump_dst[0] = self.raffle_bump;
    }
}

/// The live round. Created once and re-armed after every settlement.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Round {
    pub(crate) is_initialized: bool,
    pub(crate) state: RaffleState,
    /// One slot per entry; a player entering twice holds two slots
    pub(crate) players: Vec<Pubkey>,
    pub(crate) escrowed_balance: u64,
    pub(crate) last_close_timestamp: UnixTimestamp,
    pub(crate) outstanding_request: Option<RequestId>,
    /// Requests issued so far, used as the nonce of the next request
    pub(crate) request_nonce: u64,
    pub(crate) recent_winner: Option<Pubkey>,
    pub(crate) rounds_settled: u64,
}

impl Round {
    /// Encoded size with no players and every optional field present
    pub const FIXED_LEN: usize = 1 + 1 + 4 + 8 + 8 + (1 + 8) + 8 + (1 + 32) + 8;

    /// Account space that always fits a round with `players` entries
    pub fn space_for(players: usize) -> usize {
        Self::FIXED_LEN + players * 32
    }

    pub fn new(now: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            state: RaffleState::Open,
            players: Vec::new(),
            escrowed_balance: 0,
            last_close_timestamp: now,
            outstanding_request: None,
            request_nonce: 0,
            recent_winner: None,
            rounds_settled: 0,
        }
    }

    pub fn state(&self) -> RaffleState {
        self.state
    }

    pub fn player_count(&self) -> u64 {
        self.players.len() as u64
    }

    pub fn players(&self) -> &[Pubkey] {
        &self.players
    }

    pub fn escrowed_balance(&self) -> u64 {
        self.escrowed_balance
    }

    pub fn last_close_timestamp(&self) -> UnixTimestamp {
        self.last_close_timestamp
    }

    pub fn outstanding_request(&self) -> Option<RequestId> {
        self.outstanding_request
    }

    pub fn request_nonce(&self) -> u64 {
        self.request_nonce
    }

    /// Winner of the last settled round
    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    pub fn rounds_settled(&self) -> u64 {
        self.rounds_settled
    }

    /// Decodes a round from account data. Trailing bytes left by a
    /// longer previous round are ignored.
    pub fn unpack_from_account(data: &[u8]) -> Result<Self, ProgramError> {
        let round = Self::deserialize(&mut &data[..])
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        if !round.is_initialized {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(round)
    }

    pub fn packed_len(&self) -> Result<usize, ProgramError> {
        self.try_to_vec()
            .map(|bytes| bytes.len())
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }

    pub fn pack_into_account(&self, dst: &mut [u8]) -> Result<(), ProgramError> {
        self.serialize(&mut &mut dst[..])
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }
}

impl IsInitialized for Round {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}
