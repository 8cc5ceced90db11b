//! Deterministic tick array addresses.

use clmm_quote_domain::address::Address;
use sha2::{Digest, Sha256};

/// Seed identifying tick array accounts.
pub const TICK_ARRAY_SEED: &[u8] = b"tick_array";

/// Maps `(pool, start_index)` to the account holding that tick array.
pub trait TickArrayLocator: Send + Sync {
    fn tick_array_address(&self, pool: &Address, start_index: i32) -> Address;
}

/// Hashes the program id, [`TICK_ARRAY_SEED`], the pool and the big-endian
/// start index with SHA-256.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedLocator {
    program_id: Address,
}

impl SeedLocator {
    #[must_use]
    pub fn new(program_id: Address) -> Self {
        Self { program_id }
    }

    #[must_use]
    pub fn program_id(&self) -> Address {
        self.program_id
    }
}

impl TickArrayLocator for SeedLocator {
    fn tick_array_address(&self, pool: &Address, start_index: i32) -> Address {
        let mut hasher = Sha256::new();
        hasher.update(self.program_id.as_bytes());
        hasher.update(TICK_ARRAY_SEED);
        hasher.update(pool.as_bytes());
        hasher.update(start_index.to_be_bytes());
        Address::new(hasher.finalize().into())
    }
}
