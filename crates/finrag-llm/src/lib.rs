//! FinRAG LLM - Embedding and generation ports
//!
//! This crate defines the ports for embedding and answer generation,
//! along with Ollama adapter implementations.

pub mod ollama;
pub mod ports;

// Re-export main types
pub use ollama::{OllamaEmbedder, OllamaGenerator};
pub use ports::{Embedder, Generator};
