//! Question answering against an indexed document: retrieval, relevance
//! floor, context assembly, and grounded generation.

use std::sync::Arc;

use finrag_core::error::{FinragError, Result};
use finrag_core::models::{AnswerResult, SourceRef};
use finrag_llm::ports::{Embedder, Generator};

use crate::index::IndexHandle;

/// Fixed answer returned when retrieval finds nothing above the floor.
/// The generator is never called in that case.
pub const NOT_FOUND_ANSWER: &str =
    "The answer is not available in the provided document.";

/// Characters of chunk text quoted in a source reference
const EXCERPT_CHARS: usize = 160;

/// Retrieval policy for answering
#[derive(Debug, Clone, Copy)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per question
    pub top_k: usize,
    /// Minimum cosine similarity for a chunk to ground an answer
    pub relevance_floor: f32,
    /// Maximum assembled context size in characters
    pub max_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5, relevance_floor: 0.35, max_context_chars: 6000 }
    }
}

/// Answers questions against an index via the embedding and generation ports
pub struct AnswerPipeline {
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    config: RetrievalConfig,
}

impl AnswerPipeline {
    /// Create a new answer pipeline
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        config: RetrievalConfig,
    ) -> Self {
        Self { embedder, generator, config }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Answer a question against the given index handle.
    ///
    /// Blank questions are rejected before any index or collaborator
    /// call. Chunks below the relevance floor never reach the generator;
    /// if none survive, the fixed not-found answer is returned with
    /// `grounded = false`.
    pub fn answer(&self, question: &str, handle: &IndexHandle) -> Result<AnswerResult> {
        let question = question.trim();
        if question.is_empty() {
            return Err(FinragError::EmptyQuestion);
        }

        let query_vectors = self.embedder.embed(&[question])?;
        let query_vector =
            query_vectors.into_iter().next().ok_or_else(|| FinragError::EmbedderUnavailable {
                reason: "Embedder returned no vector for the question".to_string(),
                remediation: "Check embedder configuration".to_string(),
            })?;

        let scored = handle.index.query(&query_vector, self.config.top_k)?;

        let surviving: Vec<_> = scored
            .into_iter()
            .filter(|s| s.score >= self.config.relevance_floor)
            .collect();

        if surviving.is_empty() {
            tracing::debug!(question, "No chunk cleared the relevance floor");
            return Ok(AnswerResult {
                question: question.to_string(),
                retrieved_chunk_ids: Vec::new(),
                answer_text: NOT_FOUND_ANSWER.to_string(),
                grounded: false,
                sources: Vec::new(),
            });
        }

        // Assemble context in descending relevance order up to the size
        // budget, dropping the lowest-ranked chunks first.
        let mut passages: Vec<String> = Vec::new();
        let mut sources: Vec<SourceRef> = Vec::new();
        let mut retrieved_chunk_ids = Vec::new();
        let mut used_chars = 0usize;

        for result in &surviving {
            let Some(chunk) = handle.chunk(result.chunk_id) else {
                continue;
            };
            let passage =
                format!("[p. {}, {}] {}", chunk.page_number, chunk.kind, chunk.text);
            let passage_chars = passage.chars().count();
            if !passages.is_empty() && used_chars + passage_chars > self.config.max_context_chars
            {
                break;
            }
            used_chars += passage_chars;
            passages.push(passage);
            retrieved_chunk_ids.push(chunk.id);
            sources.push(SourceRef {
                chunk_id: chunk.id,
                page_number: chunk.page_number,
                kind: chunk.kind,
                score: result.score,
                excerpt: chunk.text.chars().take(EXCERPT_CHARS).collect(),
            });
        }

        let context = passages.join("\n\n");
        let answer_text = self.generator.generate(question, &context)?;

        tracing::debug!(
            question,
            retrieved = retrieved_chunk_ids.len(),
            context_chars = used_chars,
            "Answered question"
        );

        Ok(AnswerResult {
            question: question.to_string(),
            retrieved_chunk_ids,
            answer_text,
            grounded: true,
            sources,
        })
    }
}
