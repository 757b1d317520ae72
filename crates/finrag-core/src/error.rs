//! Error types for FinRAG

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinragError {
    // Extraction errors
    #[error("Document could not be parsed: {reason}")]
    DocumentUnreadable { reason: String },

    #[error("Document is password-protected")]
    DocumentEncrypted,

    #[error("Document contains no extractable content")]
    DocumentEmpty,

    // Embedding errors
    #[error("Embedder unavailable: {reason}. Try: {remediation}")]
    EmbedderUnavailable { reason: String, remediation: String },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    // Query errors
    #[error("Question is empty")]
    EmptyQuestion,

    #[error("No document is indexed. Upload a document first")]
    IndexNotReady,

    #[error("Answer generation failed: {reason}")]
    GenerationFailed { reason: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a caller should do about an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAdvice {
    /// Transient collaborator failure; the same request may succeed later.
    RetryLater,
    /// The input (document or question) is at fault and must change.
    FixInput,
    /// Retrieval found nothing useful; a rephrased question may work.
    Rephrase,
    /// Unexpected internal failure.
    Internal,
}

impl FinragError {
    /// Classify the error for callers deciding how to react.
    pub fn advice(&self) -> ErrorAdvice {
        match self {
            FinragError::EmbedderUnavailable { .. } | FinragError::GenerationFailed { .. } => {
                ErrorAdvice::RetryLater
            }
            FinragError::DocumentUnreadable { .. }
            | FinragError::DocumentEncrypted
            | FinragError::DocumentEmpty
            | FinragError::EmptyQuestion => ErrorAdvice::FixInput,
            FinragError::IndexNotReady => ErrorAdvice::Rephrase,
            FinragError::DimensionMismatch { .. }
            | FinragError::ConfigInvalid { .. }
            | FinragError::Io(_) => ErrorAdvice::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, FinragError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advice_classification() {
        let err = FinragError::EmbedderUnavailable {
            reason: "connection refused".to_string(),
            remediation: "start Ollama".to_string(),
        };
        assert_eq!(err.advice(), ErrorAdvice::RetryLater);

        assert_eq!(FinragError::DocumentEncrypted.advice(), ErrorAdvice::FixInput);
        assert_eq!(FinragError::EmptyQuestion.advice(), ErrorAdvice::FixInput);
        assert_eq!(FinragError::IndexNotReady.advice(), ErrorAdvice::Rephrase);
        assert_eq!(
            FinragError::DimensionMismatch { expected: 768, actual: 384 }.advice(),
            ErrorAdvice::Internal
        );
    }

    #[test]
    fn test_error_messages_carry_detail() {
        let err = FinragError::DocumentUnreadable { reason: "bad xref table".to_string() };
        assert!(err.to_string().contains("bad xref table"));

        let err = FinragError::DimensionMismatch { expected: 768, actual: 512 };
        assert!(err.to_string().contains("768"));
        assert!(err.to_string().contains("512"));
    }
}
