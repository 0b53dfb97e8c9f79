pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
/// Upper bound for the difficulty predicate: one prefix char per bit of a SHA-256 digest.
pub const MAX_DIFFICULTY: usize = 256;
pub const POW_TARGET_DIFFICULTY: usize = 5;
pub const BLOCK_SIZE: u32 = 32;
pub const GENESIS_HEIGHT: u32 = 1;
pub const GENESIS_PARENT_HASH: &str = "0";
/// Mining starts from a random nonce in `0..MINING_START_RANGE`.
pub const MINING_START_RANGE: u64 = 1000;
/// Nonces tried between two cancellation checks.
pub const MINING_BATCH: u64 = 4096;
