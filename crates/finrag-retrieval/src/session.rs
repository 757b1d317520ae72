//! Single-document session lifecycle.
//!
//! Lock policy: `RwLock`/`Mutex` guards use `unwrap()` intentionally.
//! Lock poisoning only occurs when another thread panicked while holding
//! the lock, which is an unrecoverable state for this process-wide
//! session.

use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use finrag_core::chunk::{Chunker, ChunkerConfig};
use finrag_core::error::{FinragError, Result};
use finrag_core::extract::PdfExtractor;
use finrag_core::models::{AnswerResult, UnitCounts};
use finrag_llm::ports::{Embedder, Generator};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answer::{AnswerPipeline, RetrievalConfig};
use crate::index::{IndexBuilder, IndexHandle};

/// Lifecycle state of the document session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No document uploaded yet
    Empty,
    /// An upload is being extracted, chunked, and indexed
    Indexing,
    /// A document is indexed and can answer questions
    Ready,
    /// The last upload failed and no usable index exists
    Error,
}

/// Summary returned to the caller after a successful upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub document_id: Uuid,
    pub indexed_at: DateTime<Utc>,
    pub page_count: usize,
    pub analytics: UnitCounts,
    pub chunk_count: usize,
}

struct SessionInner {
    state: SessionState,
    handle: Option<Arc<IndexHandle>>,
}

/// The process-wide active document session.
///
/// Owns at most one `IndexHandle` at a time. Uploads serialize on a
/// single-writer lock and publish a complete handle with one reference
/// swap; a failed upload leaves the prior handle untouched.
///
/// Policy choices (documented, not accidental): concurrent uploads queue
/// on the writer lock; `ask` during `Indexing` fails fast with
/// `IndexNotReady` rather than blocking behind a build.
pub struct DocumentSession {
    inner: RwLock<SessionInner>,
    upload_lock: Mutex<()>,
    extractor: PdfExtractor,
    chunker: Chunker,
    builder: IndexBuilder,
    pipeline: AnswerPipeline,
}

impl DocumentSession {
    /// Create a session with injected collaborators.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        chunker_config: ChunkerConfig,
        retrieval_config: RetrievalConfig,
    ) -> Self {
        Self {
            inner: RwLock::new(SessionInner { state: SessionState::Empty, handle: None }),
            upload_lock: Mutex::new(()),
            extractor: PdfExtractor::new(),
            chunker: Chunker::new(chunker_config),
            builder: IndexBuilder::new(Arc::clone(&embedder)),
            pipeline: AnswerPipeline::new(embedder, generator, retrieval_config),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.inner.read().unwrap().state
    }

    /// Ingest a document: extract, chunk, index, and publish atomically.
    ///
    /// Replaces any prior index only after the new build fully succeeds.
    /// On failure the session returns to `Ready` when a prior index
    /// existed, else `Error`; the prior index stays valid either way.
    pub fn upload(&self, bytes: &[u8]) -> Result<UploadReceipt> {
        let _guard = self.upload_lock.lock().unwrap();

        let had_prior = {
            let mut inner = self.inner.write().unwrap();
            let had_prior = inner.handle.is_some();
            inner.state = SessionState::Indexing;
            had_prior
        };

        match self.ingest(bytes) {
            Ok(handle) => {
                let receipt = UploadReceipt {
                    document_id: handle.document_id,
                    indexed_at: handle.built_at,
                    page_count: handle.page_count,
                    analytics: handle.analytics,
                    chunk_count: handle.chunks.len(),
                };
                let mut inner = self.inner.write().unwrap();
                inner.handle = Some(Arc::new(handle));
                inner.state = SessionState::Ready;
                tracing::info!(
                    document_id = %receipt.document_id,
                    pages = receipt.page_count,
                    chunks = receipt.chunk_count,
                    "Document indexed"
                );
                Ok(receipt)
            }
            Err(err) => {
                let mut inner = self.inner.write().unwrap();
                inner.state =
                    if had_prior { SessionState::Ready } else { SessionState::Error };
                tracing::warn!(error = %err, "Upload failed; prior index preserved: {}", had_prior);
                Err(err)
            }
        }
    }

    /// Answer a question against the current document.
    ///
    /// Blank questions are rejected before the session state is even
    /// consulted; otherwise the session must be `Ready`.
    pub fn ask(&self, question: &str) -> Result<AnswerResult> {
        if question.trim().is_empty() {
            return Err(FinragError::EmptyQuestion);
        }

        let handle = {
            let inner = self.inner.read().unwrap();
            if inner.state != SessionState::Ready {
                return Err(FinragError::IndexNotReady);
            }
            // Clone the Arc so a superseding upload cannot swap the index
            // out from under this question.
            inner.handle.clone().ok_or(FinragError::IndexNotReady)?
        };

        self.pipeline.answer(question, &handle)
    }

    /// Unit counts for the current document; available once `Ready`.
    pub fn analytics(&self) -> Result<UnitCounts> {
        let inner = self.inner.read().unwrap();
        if inner.state != SessionState::Ready {
            return Err(FinragError::IndexNotReady);
        }
        inner.handle.as_ref().map(|h| h.analytics).ok_or(FinragError::IndexNotReady)
    }

    /// Identifier of the currently indexed document, if any.
    pub fn document_id(&self) -> Option<Uuid> {
        self.inner.read().unwrap().handle.as_ref().map(|h| h.document_id)
    }

    fn ingest(&self, bytes: &[u8]) -> Result<IndexHandle> {
        let extraction = self.extractor.extract(bytes)?;
        let chunks = self.chunker.chunk(&extraction.units);
        let index = self.builder.build(&chunks)?;

        Ok(IndexHandle {
            document_id: Uuid::new_v4(),
            built_at: Utc::now(),
            page_count: extraction.page_count,
            analytics: extraction.analytics,
            chunks,
            index,
        })
    }
}
