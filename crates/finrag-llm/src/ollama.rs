use std::time::Duration;

use finrag_core::error::{FinragError, Result};
use serde::{Deserialize, Serialize};

use crate::ports::{Embedder, Generator};

/// Ollama embedder implementation
pub struct OllamaEmbedder {
    /// Base URL for Ollama API (e.g., "http://localhost:11434")
    base_url: String,

    /// Model name to use for embeddings
    model: String,

    /// Embedding dimensions (model-specific)
    dimensions: usize,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            dimensions,
            client: reqwest::Client::new(),
        }
    }

    /// Create with default localhost URL
    pub fn localhost(model: impl Into<String>, dimensions: usize) -> Self {
        Self::new("http://localhost:11434", model, dimensions)
    }
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        // Drive the async client from a local runtime; callers hold no
        // runtime of their own on this path.
        let runtime =
            tokio::runtime::Runtime::new().map_err(|e| FinragError::EmbedderUnavailable {
                reason: format!("Failed to create async runtime: {}", e),
                remediation: "Ensure tokio is properly configured".to_string(),
            })?;

        runtime.block_on(async {
            let mut embeddings = Vec::with_capacity(texts.len());

            for text in texts {
                let request = OllamaEmbedRequest {
                    model: self.model.clone(),
                    prompt: text.to_string(),
                };

                let response = self
                    .client
                    .post(format!("{}/api/embeddings", self.base_url))
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| FinragError::EmbedderUnavailable {
                        reason: format!("Failed to connect to Ollama: {}", e),
                        remediation: format!(
                            "Ensure Ollama is running at {} and the model '{}' is available. \
                             Run 'ollama pull {}' to download the model.",
                            self.base_url, self.model, self.model
                        ),
                    })?;

                if !response.status().is_success() {
                    let status = response.status();
                    let error_text = response.text().await.unwrap_or_default();
                    return Err(FinragError::EmbedderUnavailable {
                        reason: format!("Ollama API error ({}): {}", status, error_text),
                        remediation: format!(
                            "Check that the model '{}' is available. Run 'ollama list' to see installed models.",
                            self.model
                        ),
                    });
                }

                let embed_response: OllamaEmbedResponse =
                    response.json().await.map_err(|e| FinragError::EmbedderUnavailable {
                        reason: format!("Failed to parse Ollama response: {}", e),
                        remediation: "Check Ollama API compatibility".to_string(),
                    })?;

                embeddings.push(embed_response.embedding);
            }

            Ok(embeddings)
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Request body for Ollama embeddings API
#[derive(Debug, Serialize)]
struct OllamaEmbedRequest {
    model: String,
    prompt: String,
}

/// Response from Ollama embeddings API
#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embedding: Vec<f32>,
}

/// Ollama generator implementation
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaGenerator {
    /// Create a new Ollama generator with a per-request timeout.
    ///
    /// A timeout surfaces as `GenerationFailed`; the session is never left
    /// inconsistent by a slow collaborator.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into(),
            model: model.into(),
            client,
        }
    }

    /// Create with default localhost URL
    pub fn localhost(model: impl Into<String>, timeout: Duration) -> Self {
        Self::new("http://localhost:11434", model, timeout)
    }
}

impl Generator for OllamaGenerator {
    fn generate(&self, question: &str, context: &str) -> Result<String> {
        let runtime =
            tokio::runtime::Runtime::new().map_err(|e| FinragError::GenerationFailed {
                reason: format!("Failed to create async runtime: {}", e),
            })?;

        runtime.block_on(async {
            let request = OllamaGenerateRequest {
                model: self.model.clone(),
                prompt: build_prompt(question, context),
                stream: false,
                options: OllamaOptions { temperature: 0.1 },
            };

            let response = self
                .client
                .post(format!("{}/api/generate", self.base_url))
                .json(&request)
                .send()
                .await
                .map_err(|e| FinragError::GenerationFailed {
                    reason: format!("Failed to reach Ollama at {}: {}", self.base_url, e),
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                return Err(FinragError::GenerationFailed {
                    reason: format!("Ollama API error ({}): {}", status, error_text),
                });
            }

            let generate_response: OllamaGenerateResponse =
                response.json().await.map_err(|e| FinragError::GenerationFailed {
                    reason: format!("Failed to parse Ollama response: {}", e),
                })?;

            Ok(generate_response.response)
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Build the grounding prompt handed to the generation model.
///
/// The model is constrained to the retrieved report passages and told to
/// admit when the answer is not present rather than invent one.
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are an expert financial analyst assistant. Analyze and answer \
         using ONLY the annual report passages provided below. Do not use \
         external knowledge or make up information. If the answer cannot be \
         found in the passages, state clearly that it is not available in \
         the provided document.\n\
         \n\
         When answering, identify the key financial metrics, strategic \
         initiatives, and risks mentioned in the passages, and explain their \
         business significance based only on the information presented.\n\
         \n\
         CONTEXT:\n{}\n\
         \n\
         QUESTION: {}\n\
         \n\
         ANSWER:",
        context, question
    )
}

/// Request body for Ollama generate API
#[derive(Debug, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response from Ollama generate API
#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}
