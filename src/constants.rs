/// Seed of the config program address
pub const CONFIG_SEED: &[u8] = b"config";

/// Seed of the raffle program address holding the round and its escrow
pub const RAFFLE_SEED: &[u8] = b"raffle";

/// Confirmations the oracle waits before answering a request
pub const REQUEST_CONFIRMATIONS: u16 = 3;

/// Random words requested per round
pub const NUM_WORDS: u32 = 1;

pub const MAX_NUM_WORDS: u32 = 500;

/// Upper bound on the compute budget the oracle may spend on the callback
pub const MAX_CALLBACK_COMPUTE_UNITS: u32 = 1_400_000;
