//! Height-indexed, fork-tolerant block store.

use crate::{
    block::Block,
    codec,
    constants::{GENESIS_HEIGHT, POW_TARGET_DIFFICULTY},
    error::{CodecError, RejectionReason},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Admission rules for a [`Ledger`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Leading `'0'` characters required of a block's proof hash, at most
    /// [`HASH_HEX_SIZE`](crate::constants::HASH_HEX_SIZE) for mining to terminate.
    pub difficulty: usize,
    /// Lowest admissible height. Blocks here are roots and need no parent.
    pub genesis_height: u32,
    /// Also reject blocks whose stored hash does not match their contents.
    pub verify_identity: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: POW_TARGET_DIFFICULTY,
            genesis_height: GENESIS_HEIGHT,
            verify_identity: false,
        }
    }
}

/// A block that a restore dropped, with its position in the snapshot array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RejectedBlock {
    pub index: usize,
    pub height: u32,
    pub hash: String,
    pub reason: RejectionReason,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub admitted: usize,
    pub rejected: Vec<RejectedBlock>,
}

impl RestoreReport {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Blocks keyed by height. Several blocks may share a height (a fork); each keeps its
/// insertion order. A height slot exists only once a block has been admitted there.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    slots: BTreeMap<u32, Vec<Block>>,
    length: u32,
    config: LedgerConfig,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Build a fresh ledger by replaying a snapshot through [`Ledger::insert`].
    pub fn from_snapshot(
        json: &str,
        config: LedgerConfig,
    ) -> Result<(Self, RestoreReport), CodecError> {
        let mut ledger = Self::with_config(config);
        let report = ledger.restore(json)?;
        Ok((ledger, report))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Highest height ever admitted, `0` when empty.
    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    /// Blocks stored at `height`; empty when there are none.
    pub fn get(&self, height: u32) -> &[Block] {
        self.slot(height).unwrap_or_default()
    }

    /// Like [`Ledger::get`], but `None` tells that nothing was ever admitted at `height`.
    pub fn slot(&self, height: u32) -> Option<&[Block]> {
        self.slots.get(&height).map(Vec::as_slice)
    }

    /// Blocks at the highest height.
    pub fn tips(&self) -> &[Block] {
        self.get(self.length)
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.blocks().any(|b| b.hash == hash)
    }

    /// Every block, by ascending height and then insertion order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.slots.values().flatten()
    }

    /// Run the admission checks without storing anything.
    pub fn check(&self, block: &Block) -> Result<(), RejectionReason> {
        if block.height < self.config.genesis_height {
            return Err(RejectionReason::BelowGenesis);
        }
        if self.config.verify_identity && !block.has_valid_hash() {
            return Err(RejectionReason::HashMismatch);
        }
        if !block.meets_difficulty(self.config.difficulty) {
            return Err(RejectionReason::InsufficientProofOfWork);
        }
        if self.get(block.height).iter().any(|b| b.hash == block.hash) {
            return Err(RejectionReason::DuplicateBlock);
        }
        if block.height > self.config.genesis_height
            && !self
                .get(block.height - 1)
                .iter()
                .any(|b| b.hash == block.parent_hash)
        {
            return Err(RejectionReason::OrphanBlock);
        }
        Ok(())
    }

    /// Admit `block` if it passes [`Ledger::check`]. A rejection leaves the ledger untouched.
    pub fn insert(&mut self, block: Block) -> Result<(), RejectionReason> {
        if let Err(reason) = self.check(&block) {
            debug!(
                "rejected block {} at height {}: {}",
                block.hash, block.height, reason
            );
            return Err(reason);
        }
        let height = block.height;
        debug!("admitted block {} at height {}", block.hash, height);
        self.slots.entry(height).or_default().push(block);
        if height > self.length {
            self.length = height;
        }
        Ok(())
    }

    /// Canonical snapshot: one JSON array holding every stored block.
    pub fn to_json(&self) -> Result<String, CodecError> {
        codec::encode_blocks(self.blocks())
    }

    /// Replay a snapshot into this ledger, block by block in array order.
    ///
    /// A malformed document is an error and changes nothing. Blocks that fail admission,
    /// including children listed before their parent, are dropped and reported.
    pub fn restore(&mut self, json: &str) -> Result<RestoreReport, CodecError> {
        let blocks = codec::decode_blocks(json)?;
        let mut report = RestoreReport::default();
        for (index, block) in blocks.into_iter().enumerate() {
            let (height, hash) = (block.height, block.hash.clone());
            match self.insert(block) {
                Ok(()) => report.admitted += 1,
                Err(reason) => report.rejected.push(RejectedBlock {
                    index,
                    height,
                    hash,
                    reason,
                }),
            }
        }
        info!(
            "restored snapshot: {} admitted, {} rejected, length {}",
            report.admitted,
            report.rejected.len(),
            self.length
        );
        Ok(report)
    }
}
