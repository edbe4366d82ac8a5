// src/generator/sampling.rs
//
// Random material for synthetic corpora. Everything samples from a caller
// supplied `Rng` so a seeded generator replays the exact same corpus.

use rand::Rng;

use crate::types::Address;

/// Normal transfer values: 0.0001 to 10 ETH in wei.
pub const MIN_VALUE_WEI: u128 = 100_000_000_000_000;
pub const MAX_VALUE_WEI: u128 = 10_000_000_000_000_000_000;

/// Poisoning probes carry dust: 1 to 1000 wei.
pub const MAX_DUST_WEI: u128 = 1_000;

/// Gas price band: 1 to 100 gwei.
const MIN_GAS_PRICE: u64 = 1_000_000_000;
const MAX_GAS_PRICE: u64 = 100_000_000_000;

/// Vanity window preserved when forging a lookalike: `0x` + 5 hex at the
/// front, 5 hex at the back.
const VANITY_PREFIX_LEN: usize = 7;
const VANITY_SUFFIX_LEN: usize = 5;

pub fn random_address<R: Rng + ?Sized>(rng: &mut R) -> Address {
    let mut bytes = [0u8; 20];
    rng.fill(&mut bytes[..]);
    format!("0x{}", hex::encode(bytes))
}

pub fn random_tx_hash<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes[..]);
    format!("0x{}", hex::encode(bytes))
}

pub fn random_value<R: Rng + ?Sized>(rng: &mut R) -> u128 {
    rng.gen_range(MIN_VALUE_WEI..=MAX_VALUE_WEI)
}

pub fn dust_value<R: Rng + ?Sized>(rng: &mut R) -> u128 {
    rng.gen_range(1..=MAX_DUST_WEI)
}

pub fn random_gas_price<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    rng.gen_range(MIN_GAS_PRICE..=MAX_GAS_PRICE)
}

pub fn random_block_number<R: Rng + ?Sized>(rng: &mut R, base_block: u64) -> u64 {
    base_block + rng.gen_range(0..1_000_000)
}

/// Forge a vanity lookalike of `base`: same first 5 and last 5 hex
/// characters, random middle. This is exactly how poisoning addresses are
/// brute-forced in the wild, minus the brute force.
pub fn similar_address<R: Rng + ?Sized>(rng: &mut R, base: &str) -> Address {
    let chars: Vec<char> = base.chars().collect();
    if chars.len() <= VANITY_PREFIX_LEN + VANITY_SUFFIX_LEN {
        return base.to_string();
    }

    let prefix: String = chars[..VANITY_PREFIX_LEN].iter().collect();
    let suffix: String = chars[chars.len() - VANITY_SUFFIX_LEN..].iter().collect();
    let middle_len = chars.len() - VANITY_PREFIX_LEN - VANITY_SUFFIX_LEN;

    const HEX: &[u8] = b"0123456789abcdef";
    let middle: String = (0..middle_len)
        .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
        .collect();

    format!("{prefix}{middle}{suffix}")
}
