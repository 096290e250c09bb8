use solana_program::pubkey::Pubkey;

use crate::constants::{CONFIG_SEED, RAFFLE_SEED};

/// A 256-bit random word, big-endian
pub type RandomWord = [u8; 32];

/// Find the program derived address of the raffle config
pub fn find_config_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CONFIG_SEED], program_id)
}

/// Find the program derived address of the raffle round and escrow
pub fn find_raffle_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RAFFLE_SEED], program_id)
}

/// Builds a random word holding `value` as a 256-bit integer
pub fn random_word_from_u64(value: u64) -> RandomWord {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Reduces a 256-bit word modulo `modulus`, using every bit of the word.
/// Returns `None` for a zero modulus.
pub fn word_mod(word: &RandomWord, modulus: u64) -> Option<u64> {
    if modulus == 0 {
        return None;
    }
    let modulus = modulus as u128;
    let remainder = word
        .iter()
        .fold(0u128, |acc, byte| ((acc << 8) | *byte as u128) % modulus);
    Some(remainder as u64)
}
