use serde::{Deserialize, Serialize};

use super::UnitKind;

/// Unique identifier for a chunk within the current document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkId(pub u64);

/// A bounded span of normalized text derived from adjacent content units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique within the current document, assigned sequentially
    pub id: ChunkId,

    /// Normalized text content
    pub text: String,

    /// Order indexes of the contributing content units, in document order
    pub source_units: Vec<usize>,

    /// Rough token count (chars / 4)
    pub token_estimate: usize,

    /// Page of the first contributing unit
    pub page_number: usize,

    /// Kind of the first contributing unit
    pub kind: UnitKind,

    /// Order index of the first contributing unit; retrieval tie-breaker
    pub order_index: usize,

    /// Chars at the start of `text` duplicated from the previous chunk of
    /// the same run; 0 for run-initial chunks. Dropping this prefix from
    /// every chunk and concatenating reproduces the run text exactly.
    pub overlap_prefix: usize,
}

impl Chunk {
    /// Estimate tokens from character count.
    pub fn estimate_tokens(text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}
