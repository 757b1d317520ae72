//! LLM port definitions

use finrag_core::error::Result;

/// Port for embedding text into vector representations
pub trait Embedder: Send + Sync {
    /// Generate embeddings for a batch of texts
    ///
    /// # Arguments
    /// * `texts` - Slice of text strings to embed
    ///
    /// # Returns
    /// Vector of embedding vectors, one per input text
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Get the dimensionality of embeddings produced by this embedder
    fn dimensions(&self) -> usize;

    /// Get the name/identifier of the embedding model
    fn model_name(&self) -> &str;
}

/// Port for grounded answer generation
pub trait Generator: Send + Sync {
    /// Generate an answer to a question from the assembled document context
    ///
    /// # Arguments
    /// * `question` - The user's question
    /// * `context` - Retrieved document passages to ground the answer in
    ///
    /// # Returns
    /// Generated answer text
    fn generate(&self, question: &str, context: &str) -> Result<String>;

    /// Get the name/identifier of the generation model
    fn model_name(&self) -> &str;
}
