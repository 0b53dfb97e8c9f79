use crate::{
    clock::Clock,
    codec,
    constants::{BLOCK_SIZE, GENESIS_HEIGHT, GENESIS_PARENT_HASH, MINING_BATCH, MINING_START_RANGE},
    error::{CodecError, MineError},
    hash::{check_hash, identity_hash, proof_hash},
    mine::{CancelToken, NonceSearch},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// One unit of the ledger. Serializes to the canonical block JSON object.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub height: u32,
    pub timestamp: i64,
    pub hash: String,
    pub parent_hash: String,
    pub size: u32,
    pub value: String,
    pub nonce: u64,
}

impl Block {
    /// Build an unmined block stamped with `clock`'s current time.
    pub fn new(
        height: u32,
        parent_hash: impl Into<String>,
        value: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        let mut block = Self {
            height,
            timestamp: clock.now_secs(),
            hash: String::new(),
            parent_hash: parent_hash.into(),
            size: BLOCK_SIZE,
            value: value.into(),
            nonce: 0,
        };
        block.hash = block.compute_hash();
        block
    }

    pub fn genesis(value: impl Into<String>, clock: &impl Clock) -> Self {
        Self::new(GENESIS_HEIGHT, GENESIS_PARENT_HASH, value, clock)
    }

    /// Recompute the identity hash from the other fields. The nonce is not part of it.
    pub fn compute_hash(&self) -> String {
        identity_hash(
            self.height,
            self.timestamp,
            &self.parent_hash,
            self.size,
            &self.value,
        )
    }

    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }

    pub fn proof_hash(&self) -> String {
        proof_hash(&self.parent_hash, self.nonce, &self.value)
    }

    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        check_hash(difficulty, &self.proof_hash())
    }

    /// Search for a nonce meeting `difficulty`, starting from a random offset drawn from
    /// `rng`, and store it in the block. Calling again starts a fresh search.
    ///
    /// On cancellation, or a difficulty longer than a proof hash, the previous nonce is kept.
    pub fn mine<R: Rng + ?Sized>(
        &mut self,
        difficulty: usize,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<u64, MineError> {
        let start = rng.gen_range(0..MINING_START_RANGE);
        let mut search = NonceSearch::for_block(self, difficulty, start);
        let nonce = search.run(MINING_BATCH, cancel)?;
        self.nonce = nonce;
        info!(
            "Mined block {} with nonce {} after {} attempts",
            self.height,
            nonce,
            search.attempts()
        );
        Ok(nonce)
    }

    pub fn to_json(&self) -> Result<String, CodecError> {
        codec::encode_block(self)
    }

    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        codec::decode_block(json)
    }
}
