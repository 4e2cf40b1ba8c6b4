//! Winner selection with a commit/verify trail.
//!
//! 1. At start, a 32-byte seed is drawn and `commit = sha256(0x02 || seed)`
//!    is published together with the pool digest.
//! 2. At pick, `final = sha256(0x03 || seed || pool_digest)` and
//!    `index = uint128(final[0..16]) % pool_size`.
//! 3. The seed is disclosed with the outcome so anyone can recompute 1 and 2.

use bravo_common::digest::{decode_hash, draw_randomness, index_from_randomness, pool_digest};
use bravo_common::{seed_commitment, TicketNumber};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::VerifyError;

pub trait EntropySource {
    fn next_seed(&mut self) -> [u8; 32];
}

/// Seeds from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn next_seed(&mut self) -> [u8; 32] {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        seed
    }
}

/// Deterministic seeds, `sha256(root || counter_be)`, for replays and tests.
#[derive(Debug, Clone)]
pub struct SeededEntropy {
    root: [u8; 32],
    counter: u64,
}

impl SeededEntropy {
    pub fn new(root: &[u8]) -> Self {
        Self {
            root: Sha256::digest(root).into(),
            counter: 0,
        }
    }
}

impl EntropySource for SeededEntropy {
    fn next_seed(&mut self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.root);
        hasher.update(self.counter.to_be_bytes());
        self.counter += 1;
        hasher.finalize().into()
    }
}

/// Index of the winner for `seed` over a pool with the given digest.
pub fn winner_index(seed: &[u8; 32], pool_digest: &[u8; 32], pool_size: usize) -> Option<usize> {
    index_from_randomness(&draw_randomness(seed, pool_digest), pool_size)
}

/// Re-derives a published draw and checks it against the claimed winner.
pub fn verify_draw(
    seed_hex: &str,
    seed_commit_hex: &str,
    pool: &[TicketNumber],
    claimed_index: usize,
) -> Result<(), VerifyError> {
    let seed = decode_hash(seed_hex).ok_or_else(|| VerifyError::InvalidHex {
        field: "seed".to_string(),
    })?;
    let commit = decode_hash(seed_commit_hex).ok_or_else(|| VerifyError::InvalidHex {
        field: "seed_commit".to_string(),
    })?;

    if seed_commitment(&seed) != commit {
        return Err(VerifyError::CommitMismatch);
    }

    let digest = pool_digest(pool);
    let derived = winner_index(&seed, &digest, pool.len()).ok_or(VerifyError::EmptyPool)?;
    if derived != claimed_index {
        return Err(VerifyError::IndexMismatch {
            derived,
            claimed: claimed_index,
        });
    }
    Ok(())
}
