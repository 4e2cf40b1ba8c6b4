use sha2::{Digest, Sha256};

use crate::types::TicketNumber;

const LEAF_PREFIX: u8 = 0x00;
const POOL_PREFIX: u8 = 0x01;
const COMMIT_PREFIX: u8 = 0x02;
const DRAW_PREFIX: u8 = 0x03;

/// Hash of one pool entry.
///
/// `leaf_hash = sha256( 0x00 || len_u32_be || ticket_number_bytes )`
///
/// The length prefix keeps `["12", "3"]` and `["1", "23"]` apart once leaves
/// are concatenated into the pool digest.
pub fn ticket_leaf_hash(ticket_number: &TicketNumber) -> [u8; 32] {
    let bytes = ticket_number.as_str().as_bytes();
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update((bytes.len() as u32).to_be_bytes());
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Fingerprint of an ordered draw pool.
///
/// `pool_digest = sha256( 0x01 || leaf_0 || leaf_1 || ... )`
///
/// Order matters: the winning index refers to a position in this sequence.
pub fn pool_digest<'a, I>(ticket_numbers: I) -> [u8; 32]
where
    I: IntoIterator<Item = &'a TicketNumber>,
{
    let mut hasher = Sha256::new();
    hasher.update([POOL_PREFIX]);
    for number in ticket_numbers {
        hasher.update(ticket_leaf_hash(number));
    }
    hasher.finalize().into()
}

/// Public commitment to a draw seed, published before the winner is picked.
///
/// `commit = sha256( 0x02 || seed )`
pub fn seed_commitment(seed: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([COMMIT_PREFIX]);
    hasher.update(seed);
    hasher.finalize().into()
}

/// Randomness the winner is derived from, bound to both seed and pool.
///
/// `final = sha256( 0x03 || seed || pool_digest )`
pub fn draw_randomness(seed: &[u8; 32], pool_digest: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([DRAW_PREFIX]);
    hasher.update(seed);
    hasher.update(pool_digest);
    hasher.finalize().into()
}

/// Maps randomness onto `[0, pool_size)`.
///
/// `index = uint128(final[0..16]) % pool_size`. The modulo bias is below
/// `pool_size / 2^128`. Returns `None` for an empty pool.
pub fn index_from_randomness(randomness: &[u8; 32], pool_size: usize) -> Option<usize> {
    if pool_size == 0 {
        return None;
    }
    let mut head = [0u8; 16];
    head.copy_from_slice(&randomness[0..16]);
    let raw = u128::from_be_bytes(head);
    Some((raw % pool_size as u128) as usize)
}

/// Decodes a hex string into a 32-byte array, rejecting any other length.
pub fn decode_hash(hex_str: &str) -> Option<[u8; 32]> {
    let bytes = hex::decode(hex_str).ok()?;
    bytes.try_into().ok()
}
