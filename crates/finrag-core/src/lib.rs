//! FinRAG Core - Domain models, configuration, extraction, and chunking
//!
//! This crate contains the core domain logic for the FinRAG system:
//! the typed content model of an extracted document, the PDF extractor,
//! the chunker, the error taxonomy, and layered configuration.

pub mod chunk;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;

pub use error::{FinragError, Result};
