//! Proof-of-work nonce search.
//!
//! The search is an explicit state machine ([`NonceSearch`]) so callers can run it in
//! bounded steps, check a [`CancelToken`] in between and resume later.

use crate::{
    block::Block,
    constants::HASH_HEX_SIZE,
    error::MineError,
    hash::{check_hash, proof_hash},
};
use rayon::prelude::*;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use tracing::info;

/// Shared stop flag for mining. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    Found(u64),
    Pending,
}

/// Resumable linear search for a nonce whose proof hash meets `difficulty`.
#[derive(Clone, Debug)]
pub struct NonceSearch {
    parent_hash: String,
    value: String,
    difficulty: usize,
    next: u64,
    attempts: u64,
}

impl NonceSearch {
    pub fn new(
        parent_hash: impl Into<String>,
        value: impl Into<String>,
        difficulty: usize,
        start: u64,
    ) -> Self {
        Self {
            parent_hash: parent_hash.into(),
            value: value.into(),
            difficulty,
            next: start,
            attempts: 0,
        }
    }

    /// Search for the block's parent link and payload.
    pub fn for_block(block: &Block, difficulty: usize, start: u64) -> Self {
        Self::new(&*block.parent_hash, &*block.value, difficulty, start)
    }

    /// Try at most `budget` nonces. A found nonce is not revisited by later steps.
    pub fn step(&mut self, budget: u64) -> SearchStatus {
        for _ in 0..budget {
            let nonce = self.next;
            self.next = self.next.wrapping_add(1);
            self.attempts += 1;
            if check_hash(
                self.difficulty,
                &proof_hash(&self.parent_hash, nonce, &self.value),
            ) {
                return SearchStatus::Found(nonce);
            }
        }
        SearchStatus::Pending
    }

    /// Step until a nonce is found or `cancel` fires.
    pub fn run(&mut self, batch: u64, cancel: &CancelToken) -> Result<u64, MineError> {
        ensure_reachable(self.difficulty)?;
        loop {
            if cancel.is_cancelled() {
                return Err(MineError::Cancelled {
                    attempts: self.attempts,
                });
            }
            if let SearchStatus::Found(nonce) = self.step(batch) {
                return Ok(nonce);
            }
        }
    }

    pub fn next_nonce(&self) -> u64 {
        self.next
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }
}

/// A proof hash has [`HASH_HEX_SIZE`] characters, so no nonce meets a longer prefix.
pub fn ensure_reachable(difficulty: usize) -> Result<(), MineError> {
    if difficulty > HASH_HEX_SIZE {
        return Err(MineError::Unreachable {
            difficulty,
            max: HASH_HEX_SIZE,
        });
    }
    Ok(())
}

/// Mine `block` on all rayon threads, starting at `start`.
///
/// Returns whichever satisfying nonce a worker reaches first, which need not be the
/// smallest one above `start`.
pub fn mine_parallel(
    block: &mut Block,
    difficulty: usize,
    start: u64,
    cancel: &CancelToken,
) -> Result<u64, MineError> {
    ensure_reachable(difficulty)?;
    let attempts = AtomicU64::new(0);
    let (parent_hash, value) = (block.parent_hash.as_str(), block.value.as_str());

    let found = (start..u64::MAX).into_par_iter().find_map_any(|nonce| {
        if cancel.is_cancelled() {
            return Some(None);
        }
        attempts.fetch_add(1, Ordering::Relaxed);
        check_hash(difficulty, &proof_hash(parent_hash, nonce, value)).then_some(Some(nonce))
    });

    match found.flatten() {
        Some(nonce) => {
            block.nonce = nonce;
            info!(
                "Mined block {} in parallel with nonce {} and hash {}",
                block.height, nonce, block.hash
            );
            Ok(nonce)
        }
        None => Err(MineError::Cancelled {
            attempts: attempts.load(Ordering::Relaxed),
        }),
    }
}
