use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to move blocks in or out of their canonical JSON form.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed block JSON: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode block JSON: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Why [`Ledger::insert`](crate::ledger::Ledger::insert) turned a block away.
///
/// A rejection never changes the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("proof-of-work hash does not meet the difficulty target")]
    InsufficientProofOfWork,
    #[error("a block with the same hash is already stored at this height")]
    DuplicateBlock,
    #[error("no block at the previous height matches the parent hash")]
    OrphanBlock,
    #[error("height is below the genesis height")]
    BelowGenesis,
    #[error("stored hash does not match the block contents")]
    HashMismatch,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MineError {
    #[error("mining cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },
    #[error("difficulty {difficulty} exceeds the {max} hex characters of a proof hash")]
    Unreachable { difficulty: usize, max: usize },
}
