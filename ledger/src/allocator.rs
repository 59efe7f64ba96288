//! Identifier allocation.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Hands out positive ids drawn from a wide random space, never repeating
/// a value it has issued before.
///
/// One allocator serves every entity kind of a ledger, so an account id can
/// never equal a transaction id.
#[derive(Debug)]
pub struct IdAllocator {
    rng: StdRng,
    issued: HashSet<u64>,
}

impl IdAllocator {
    /// Create an allocator seeded from the operating system.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a deterministic allocator.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            issued: HashSet::new(),
        }
    }

    /// Allocate a fresh id in `1..=i64::MAX`.
    pub fn allocate(&mut self) -> u64 {
        loop {
            let id = self.rng.gen_range(1..=i64::MAX as u64);
            if self.issued.insert(id) {
                return id;
            }
        }
    }

    /// Number of ids issued so far.
    pub fn issued(&self) -> usize {
        self.issued.len()
    }

    /// Check whether an id was issued by this allocator.
    pub fn contains(&self, id: u64) -> bool {
        self.issued.contains(&id)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
