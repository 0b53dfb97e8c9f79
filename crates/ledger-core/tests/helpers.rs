#![allow(dead_code)]

use ledger_core::{Block, CancelToken, FixedClock, Ledger, LedgerConfig};
use rand::{rngs::StdRng, SeedableRng};

pub const TS: i64 = 1_600_000_000;
pub const FAST_DIFFICULTY: usize = 3;

pub fn fast_ledger() -> Ledger {
    Ledger::with_config(fast_config())
}

pub fn fast_config() -> LedgerConfig {
    LedgerConfig {
        difficulty: FAST_DIFFICULTY,
        ..LedgerConfig::default()
    }
}

/// Build and mine a block with a fixed clock and seeded RNG.
pub fn mined_block(height: u32, parent: &str, value: &str, difficulty: usize) -> Block {
    let mut block = Block::new(height, parent, value, &FixedClock(TS));
    let mut rng = StdRng::seed_from_u64(u64::from(height));
    block
        .mine(difficulty, &mut rng, &CancelToken::new())
        .expect("mining is never cancelled here");
    block
}

/// A linear chain of `n` blocks starting at the genesis height.
pub fn linear_chain(n: u32, difficulty: usize) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    for height in 1..=n {
        let parent = blocks
            .last()
            .map(|b| b.hash.clone())
            .unwrap_or_else(|| "0".to_string());
        blocks.push(mined_block(height, &parent, &format!("block-{height}"), difficulty));
    }
    blocks
}

pub fn height_hash_pairs(ledger: &Ledger) -> Vec<(u32, String)> {
    let mut pairs: Vec<(u32, String)> = ledger
        .blocks()
        .map(|b| (b.height, b.hash.clone()))
        .collect();
    pairs.sort();
    pairs
}
