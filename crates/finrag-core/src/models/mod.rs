//! Domain models

pub mod answer;
pub mod chunk;
pub mod unit;

pub use answer::{AnswerResult, SourceRef};
pub use chunk::{Chunk, ChunkId};
pub use unit::{ContentUnit, ExtractionResult, TableGrid, UnitBody, UnitCounts, UnitKind};
