//! Per-document embedding index: build and nearest-neighbor query.
//!
//! A `VectorIndex` is an immutable value. Builds produce a fresh index
//! that callers publish with a single reference swap, so readers only
//! ever observe a complete index.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use finrag_core::error::{FinragError, Result};
use finrag_core::models::{Chunk, ChunkId, UnitCounts, UnitKind};
use finrag_llm::ports::Embedder;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Retrieval-time metadata copied from the source chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub page_number: usize,
    pub kind: UnitKind,
    pub order_index: usize,
}

/// One stored embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Associated chunk ID
    pub chunk_id: ChunkId,

    /// L2-normalized embedding vector
    pub vector: Vec<f32>,

    /// Metadata for filtering and explanation
    pub metadata: RecordMetadata,
}

/// A chunk scored against a query vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk_id: ChunkId,
    pub score: f32,
}

/// Immutable similarity index over one document's chunks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    dimensions: usize,
    records: Vec<EmbeddingRecord>,
}

impl VectorIndex {
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[EmbeddingRecord] {
        &self.records
    }

    /// Return the top `top_k` records by descending cosine similarity.
    ///
    /// Vectors are normalized at insertion, so similarity is a dot
    /// product and scores lie in [-1, 1]. Ties break by ascending
    /// `order_index` (earlier document position wins). If the index holds
    /// fewer than `top_k` records, all are returned.
    pub fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        if vector.len() != self.dimensions {
            return Err(FinragError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }

        let query = l2_normalize(vector.to_vec());

        let mut scored: Vec<(f32, usize, ChunkId)> = self
            .records
            .iter()
            .map(|record| {
                let score: f32 =
                    record.vector.iter().zip(query.iter()).map(|(a, b)| a * b).sum();
                (score, record.metadata.order_index, record.chunk_id)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
        });
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(score, _, chunk_id)| ScoredChunk { chunk_id, score })
            .collect())
    }
}

/// Normalize a vector to unit length; all-zero vectors pass through.
fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }
    vector
}

/// Builds a complete index from a document's chunks
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl IndexBuilder {
    /// Create a new index builder
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder, batch_size: 32 }
    }

    /// Set the batch size for embedding generation
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Compute one embedding per chunk and assemble a fresh index.
    ///
    /// Any embedding failure aborts the whole build; no partial index is
    /// ever returned. The caller keeps its prior index until this method
    /// succeeds.
    pub fn build(&self, chunks: &[Chunk]) -> Result<VectorIndex> {
        let dimensions = self.embedder.dimensions();
        let mut records = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let vectors = self.embedder.embed(&texts)?;

            if vectors.len() != batch.len() {
                return Err(FinragError::EmbedderUnavailable {
                    reason: format!(
                        "Embedder returned {} vectors for {} texts",
                        vectors.len(),
                        batch.len()
                    ),
                    remediation: "Check embedder batch handling".to_string(),
                });
            }

            for (chunk, vector) in batch.iter().zip(vectors.into_iter()) {
                if vector.len() != dimensions {
                    return Err(FinragError::DimensionMismatch {
                        expected: dimensions,
                        actual: vector.len(),
                    });
                }
                records.push(EmbeddingRecord {
                    chunk_id: chunk.id,
                    vector: l2_normalize(vector),
                    metadata: RecordMetadata {
                        page_number: chunk.page_number,
                        kind: chunk.kind,
                        order_index: chunk.order_index,
                    },
                });
            }
        }

        tracing::debug!(
            records = records.len(),
            dimensions,
            model = self.embedder.model_name(),
            "Built embedding index"
        );

        Ok(VectorIndex { dimensions, records })
    }
}

/// Immutable published state for one indexed document.
///
/// The session swaps an `Arc<IndexHandle>` on successful builds and never
/// mutates a published handle, so analytics, chunks, and index always
/// describe the same document.
#[derive(Debug, Clone)]
pub struct IndexHandle {
    /// Identifier of the indexed document
    pub document_id: Uuid,

    /// When the index build completed
    pub built_at: DateTime<Utc>,

    /// Number of pages in the source document
    pub page_count: usize,

    /// Per-kind unit counts for the document
    pub analytics: UnitCounts,

    /// All chunks, positioned by sequential chunk id
    pub chunks: Vec<Chunk>,

    /// The similarity index over those chunks
    pub index: VectorIndex,
}

impl IndexHandle {
    /// Look up a chunk by id.
    pub fn chunk(&self, id: ChunkId) -> Option<&Chunk> {
        // Ids are assigned sequentially by the chunker
        match self.chunks.get(id.0 as usize) {
            Some(chunk) if chunk.id == id => Some(chunk),
            _ => self.chunks.iter().find(|c| c.id == id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEmbedder {
        vectors: Vec<Vec<f32>>,
        dims: usize,
    }

    impl Embedder for FixedEmbedder {
        fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().enumerate().map(|(i, _)| self.vectors[i % self.vectors.len()].clone()).collect())
        }

        fn dimensions(&self) -> usize {
            self.dims
        }

        fn model_name(&self) -> &str {
            "fixed-test"
        }
    }

    fn chunk(id: u64, order_index: usize, text: &str) -> Chunk {
        Chunk {
            id: ChunkId(id),
            text: text.to_string(),
            source_units: vec![order_index],
            token_estimate: Chunk::estimate_tokens(text),
            page_number: 1,
            kind: UnitKind::Text,
            order_index,
            overlap_prefix: 0,
        }
    }

    fn index_from(vectors: Vec<(u64, usize, Vec<f32>)>) -> VectorIndex {
        let records = vectors
            .into_iter()
            .map(|(id, order_index, vector)| EmbeddingRecord {
                chunk_id: ChunkId(id),
                vector: l2_normalize(vector),
                metadata: RecordMetadata {
                    page_number: 1,
                    kind: UnitKind::Text,
                    order_index,
                },
            })
            .collect::<Vec<_>>();
        let dimensions = records.first().map(|r| r.vector.len()).unwrap_or(0);
        VectorIndex { dimensions, records }
    }

    #[test]
    fn test_l2_normalize() {
        let normalized = l2_normalize(vec![3.0, 4.0]);
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);

        // Zero vectors pass through untouched
        assert_eq!(l2_normalize(vec![0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_query_orders_by_score_descending() {
        let index = index_from(vec![
            (0, 0, vec![1.0, 0.0]),
            (1, 1, vec![0.0, 1.0]),
            (2, 2, vec![1.0, 1.0]),
        ]);

        let results = index.query(&[1.0, 0.0], 3).unwrap();
        assert_eq!(results[0].chunk_id, ChunkId(0));
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(results[1].chunk_id, ChunkId(2));
        assert_eq!(results[2].chunk_id, ChunkId(1));
    }

    #[test]
    fn test_query_ties_break_by_order_index() {
        // Identical vectors, differing document positions; the record
        // with the later id but earlier order_index must come first.
        let index = index_from(vec![
            (0, 5, vec![1.0, 0.0]),
            (1, 2, vec![1.0, 0.0]),
            (2, 9, vec![1.0, 0.0]),
        ]);

        let results = index.query(&[1.0, 0.0], 3).unwrap();
        let ids: Vec<ChunkId> = results.iter().map(|r| r.chunk_id).collect();
        assert_eq!(ids, vec![ChunkId(1), ChunkId(0), ChunkId(2)]);
    }

    #[test]
    fn test_query_clamps_top_k_to_index_size() {
        let index = index_from(vec![(0, 0, vec![1.0, 0.0]), (1, 1, vec![0.0, 1.0])]);
        assert_eq!(index.query(&[1.0, 0.0], 10).unwrap().len(), 2);
        assert!(index.query(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_query_rejects_wrong_dimension() {
        let index = index_from(vec![(0, 0, vec![1.0, 0.0])]);
        let err = index.query(&[1.0, 0.0, 0.0], 1).unwrap_err();
        assert!(matches!(err, FinragError::DimensionMismatch { expected: 2, actual: 3 }));
    }

    #[test]
    fn test_query_scores_within_unit_range() {
        let index = index_from(vec![
            (0, 0, vec![1.0, 1.0, 0.0]),
            (1, 1, vec![-1.0, 0.0, 2.0]),
        ]);
        for result in index.query(&[0.5, -0.25, 1.0], 2).unwrap() {
            assert!(result.score >= -1.0 - 1e-6);
            assert!(result.score <= 1.0 + 1e-6);
        }
    }

    #[test]
    fn test_build_normalizes_vectors() {
        let embedder = FixedEmbedder { vectors: vec![vec![3.0, 4.0]], dims: 2 };
        let builder = IndexBuilder::new(Arc::new(embedder));
        let index = builder.build(&[chunk(0, 0, "alpha")]).unwrap();

        let norm: f32 =
            index.records()[0].vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_build_rejects_dimension_mismatch() {
        let embedder = FixedEmbedder { vectors: vec![vec![1.0, 2.0, 3.0]], dims: 2 };
        let builder = IndexBuilder::new(Arc::new(embedder));
        let err = builder.build(&[chunk(0, 0, "alpha")]).unwrap_err();
        assert!(matches!(err, FinragError::DimensionMismatch { expected: 2, actual: 3 }));
    }

    #[test]
    fn test_build_copies_chunk_metadata() {
        let embedder = FixedEmbedder { vectors: vec![vec![1.0, 0.0]], dims: 2 };
        let builder = IndexBuilder::new(Arc::new(embedder)).with_batch_size(1);
        let mut table_chunk = chunk(0, 7, "Year | Revenue 2023 | 4.2M");
        table_chunk.kind = UnitKind::Table;
        table_chunk.page_number = 3;

        let index = builder.build(&[table_chunk]).unwrap();
        let metadata = index.records()[0].metadata;
        assert_eq!(metadata.page_number, 3);
        assert_eq!(metadata.kind, UnitKind::Table);
        assert_eq!(metadata.order_index, 7);
    }

    #[test]
    fn test_empty_build_yields_empty_index() {
        let embedder = FixedEmbedder { vectors: vec![vec![1.0, 0.0]], dims: 2 };
        let builder = IndexBuilder::new(Arc::new(embedder));
        let index = builder.build(&[]).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.dimensions(), 2);
    }

    #[test]
    fn test_handle_chunk_lookup() {
        let chunks = vec![chunk(0, 0, "a"), chunk(1, 1, "b")];
        let handle = IndexHandle {
            document_id: Uuid::new_v4(),
            built_at: Utc::now(),
            page_count: 1,
            analytics: UnitCounts { text: 2, table: 0, figure: 0 },
            chunks,
            index: index_from(vec![(0, 0, vec![1.0]), (1, 1, vec![1.0])]),
        };

        assert_eq!(handle.chunk(ChunkId(1)).unwrap().text, "b");
        assert!(handle.chunk(ChunkId(5)).is_none());
    }
}
