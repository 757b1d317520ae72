//! FinRAG Retrieval - Vector index, grounded answering, and the
//! document session
//!
//! This crate implements the retrieval use cases: building the
//! per-document embedding index, answering questions against it, and the
//! single-document session lifecycle that coordinates both.

pub mod answer;
pub mod index;
pub mod session;

pub use answer::{AnswerPipeline, RetrievalConfig, NOT_FOUND_ANSWER};
pub use index::{EmbeddingRecord, IndexBuilder, IndexHandle, RecordMetadata, ScoredChunk, VectorIndex};
pub use session::{DocumentSession, SessionState, UploadReceipt};
