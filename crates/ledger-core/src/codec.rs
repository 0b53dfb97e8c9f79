//! Canonical JSON forms: one block object, or a flat array of block objects.

use crate::{block::Block, error::CodecError};

pub fn encode_block(block: &Block) -> Result<String, CodecError> {
    serde_json::to_string(block).map_err(CodecError::Encode)
}

pub fn decode_block(json: &str) -> Result<Block, CodecError> {
    serde_json::from_str(json).map_err(CodecError::Decode)
}

/// Encode blocks as a single array, preserving their order.
pub fn encode_blocks<'a, I>(blocks: I) -> Result<String, CodecError>
where
    I: IntoIterator<Item = &'a Block>,
{
    let blocks: Vec<&Block> = blocks.into_iter().collect();
    serde_json::to_string(&blocks).map_err(CodecError::Encode)
}

pub fn decode_blocks(json: &str) -> Result<Vec<Block>, CodecError> {
    serde_json::from_str(json).map_err(CodecError::Decode)
}
