use serde::{Deserialize, Serialize};

use super::{ChunkId, UnitKind};

/// Reference to a retrieved chunk used to ground an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Retrieved chunk
    pub chunk_id: ChunkId,

    /// Page of the chunk's first contributing unit
    pub page_number: usize,

    /// Kind of the chunk's first contributing unit
    pub kind: UnitKind,

    /// Cosine similarity against the question
    pub score: f32,

    /// Leading excerpt of the chunk text
    pub excerpt: String,
}

/// Result of answering one question against the active document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    /// The question as asked
    pub question: String,

    /// Retrieved chunks that cleared the relevance floor, most relevant first
    pub retrieved_chunk_ids: Vec<ChunkId>,

    /// Generated (or fixed not-found) answer text
    pub answer_text: String,

    /// True only if at least one chunk scored above the relevance floor
    pub grounded: bool,

    /// Source references for the retained chunks, most relevant first
    pub sources: Vec<SourceRef>,
}
