use crate::error::{FinragError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for FinRAG
#[derive(Debug, Clone)]
pub struct FinragConfig {
    /// Base URL of the Ollama endpoint serving both collaborators
    pub ollama_url: ConfigValue<String>,
    /// Embedding model name
    pub embedder_model: ConfigValue<String>,
    /// Embedding dimensions (model-specific)
    pub embedder_dimensions: ConfigValue<usize>,
    /// Generation model name
    pub generator_model: ConfigValue<String>,
    /// Timeout for one generation call, in seconds
    pub generation_timeout_secs: ConfigValue<u64>,
    /// Maximum chunk size in characters
    pub max_chunk_size: ConfigValue<usize>,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: ConfigValue<usize>,
    /// Number of chunks retrieved per question
    pub top_k: ConfigValue<usize>,
    /// Minimum cosine similarity for a chunk to ground an answer
    pub relevance_floor: ConfigValue<f32>,
    /// Maximum assembled context size in characters
    pub max_context_chars: ConfigValue<usize>,
}

impl FinragConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            ollama_url: ConfigValue::new("http://localhost:11434".to_string(), ConfigSource::Default),
            embedder_model: ConfigValue::new("nomic-embed-text".to_string(), ConfigSource::Default),
            embedder_dimensions: ConfigValue::new(768, ConfigSource::Default),
            generator_model: ConfigValue::new("llama3.1".to_string(), ConfigSource::Default),
            generation_timeout_secs: ConfigValue::new(60, ConfigSource::Default),
            max_chunk_size: ConfigValue::new(1200, ConfigSource::Default),
            chunk_overlap: ConfigValue::new(120, ConfigSource::Default),
            top_k: ConfigValue::new(5, ConfigSource::Default),
            relevance_floor: ConfigValue::new(0.35, ConfigSource::Default),
            max_context_chars: ConfigValue::new(6000, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| FinragError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| FinragError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(v) = file_config.ollama_url {
            self.ollama_url.update(v, ConfigSource::File);
        }
        if let Some(v) = file_config.embedder_model {
            self.embedder_model.update(v, ConfigSource::File);
        }
        if let Some(v) = file_config.embedder_dimensions {
            self.embedder_dimensions.update(v, ConfigSource::File);
        }
        if let Some(v) = file_config.generator_model {
            self.generator_model.update(v, ConfigSource::File);
        }
        if let Some(v) = file_config.generation_timeout_secs {
            self.generation_timeout_secs.update(v, ConfigSource::File);
        }
        if let Some(v) = file_config.max_chunk_size {
            self.max_chunk_size.update(v, ConfigSource::File);
        }
        if let Some(v) = file_config.chunk_overlap {
            self.chunk_overlap.update(v, ConfigSource::File);
        }
        if let Some(v) = file_config.top_k {
            self.top_k.update(v, ConfigSource::File);
        }
        if let Some(v) = file_config.relevance_floor {
            self.relevance_floor.update(v, ConfigSource::File);
        }
        if let Some(v) = file_config.max_context_chars {
            self.max_context_chars.update(v, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        if let Ok(url) = env::var("FINRAG_OLLAMA_URL") {
            self.ollama_url.update(url, ConfigSource::Environment);
        }

        if let Ok(model) = env::var("FINRAG_EMBEDDER_MODEL") {
            self.embedder_model.update(model, ConfigSource::Environment);
        }

        if let Ok(dim_str) = env::var("FINRAG_EMBEDDER_DIM") {
            match dim_str.parse::<usize>() {
                Ok(dim) => self.embedder_dimensions.update(dim, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FINRAG_EMBEDDER_DIM value '{}': expected integer",
                    dim_str
                ),
            }
        }

        if let Ok(model) = env::var("FINRAG_GENERATOR_MODEL") {
            self.generator_model.update(model, ConfigSource::Environment);
        }

        if let Ok(secs_str) = env::var("FINRAG_GENERATION_TIMEOUT_SECS") {
            match secs_str.parse::<u64>() {
                Ok(secs) => self.generation_timeout_secs.update(secs, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FINRAG_GENERATION_TIMEOUT_SECS value '{}': expected integer",
                    secs_str
                ),
            }
        }

        if let Ok(size_str) = env::var("FINRAG_MAX_CHUNK_SIZE") {
            match size_str.parse::<usize>() {
                Ok(size) => self.max_chunk_size.update(size, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FINRAG_MAX_CHUNK_SIZE value '{}': expected integer",
                    size_str
                ),
            }
        }

        if let Ok(overlap_str) = env::var("FINRAG_CHUNK_OVERLAP") {
            match overlap_str.parse::<usize>() {
                Ok(overlap) => self.chunk_overlap.update(overlap, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FINRAG_CHUNK_OVERLAP value '{}': expected integer",
                    overlap_str
                ),
            }
        }

        if let Ok(k_str) = env::var("FINRAG_TOP_K") {
            match k_str.parse::<usize>() {
                Ok(k) => self.top_k.update(k, ConfigSource::Environment),
                Err(_) => {
                    tracing::warn!("Invalid FINRAG_TOP_K value '{}': expected integer", k_str)
                }
            }
        }

        if let Ok(floor_str) = env::var("FINRAG_RELEVANCE_FLOOR") {
            match floor_str.parse::<f32>() {
                Ok(floor) => self.relevance_floor.update(floor, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FINRAG_RELEVANCE_FLOOR value '{}': expected float",
                    floor_str
                ),
            }
        }

        if let Ok(chars_str) = env::var("FINRAG_MAX_CONTEXT_CHARS") {
            match chars_str.parse::<usize>() {
                Ok(chars) => self.max_context_chars.update(chars, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FINRAG_MAX_CONTEXT_CHARS value '{}': expected integer",
                    chars_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(url) = overrides.ollama_url {
            self.ollama_url.update(url, ConfigSource::Cli);
        }
        if let Some(model) = overrides.embedder_model {
            self.embedder_model.update(model, ConfigSource::Cli);
        }
        if let Some(model) = overrides.generator_model {
            self.generator_model.update(model, ConfigSource::Cli);
        }
        if let Some(k) = overrides.top_k {
            self.top_k.update(k, ConfigSource::Cli);
        }
        if let Some(floor) = overrides.relevance_floor {
            self.relevance_floor.update(floor, ConfigSource::Cli);
        }
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.top_k.value == 0 {
            return Err(FinragError::ConfigInvalid {
                key: "top_k".to_string(),
                reason: "top_k must be at least 1".to_string(),
            });
        }

        if !(-1.0..=1.0).contains(&self.relevance_floor.value) {
            return Err(FinragError::ConfigInvalid {
                key: "relevance_floor".to_string(),
                reason: format!(
                    "relevance_floor ({}) must lie in [-1, 1]",
                    self.relevance_floor.value
                ),
            });
        }

        if self.chunk_overlap.value >= self.max_chunk_size.value {
            return Err(FinragError::ConfigInvalid {
                key: "chunk_overlap".to_string(),
                reason: format!(
                    "overlap ({}) must be less than max_chunk_size ({})",
                    self.chunk_overlap.value, self.max_chunk_size.value
                ),
            });
        }

        Ok(())
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    ollama_url: Option<String>,
    embedder_model: Option<String>,
    embedder_dimensions: Option<usize>,
    generator_model: Option<String>,
    generation_timeout_secs: Option<u64>,
    max_chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    top_k: Option<usize>,
    relevance_floor: Option<f32>,
    max_context_chars: Option<usize>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub ollama_url: Option<String>,
    pub embedder_model: Option<String>,
    pub generator_model: Option<String>,
    pub top_k: Option<usize>,
    pub relevance_floor: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = FinragConfig::with_defaults();
        assert_eq!(config.embedder_model.value, "nomic-embed-text");
        assert_eq!(config.embedder_dimensions.value, 768);
        assert_eq!(config.top_k.value, 5);
        assert_eq!(config.top_k.source, ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);

        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);

        // Lower precedence does not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
embedder_model = "custom-embed"
embedder_dimensions = 384
top_k = 8
relevance_floor = 0.5
"#
        )
        .unwrap();

        let config = FinragConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.embedder_model.value, "custom-embed");
        assert_eq!(config.embedder_model.source, ConfigSource::File);
        assert_eq!(config.embedder_dimensions.value, 384);
        assert_eq!(config.top_k.value, 8);
        assert!((config.relevance_floor.value - 0.5).abs() < f32::EPSILON);
        // Untouched key keeps its default
        assert_eq!(config.generator_model.source, ConfigSource::Default);
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "top_k = [not valid").unwrap();

        let result = FinragConfig::with_defaults().load_from_file(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = FinragConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            top_k: Some(3),
            relevance_floor: Some(0.2),
            ..Default::default()
        });

        assert_eq!(config.top_k.value, 3);
        assert_eq!(config.top_k.source, ConfigSource::Cli);
        assert_eq!(config.embedder_model.source, ConfigSource::Default);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = FinragConfig::with_defaults();
        config.top_k.value = 0;
        assert!(config.validate().is_err());

        let mut config = FinragConfig::with_defaults();
        config.relevance_floor.value = 1.5;
        assert!(config.validate().is_err());

        let mut config = FinragConfig::with_defaults();
        config.chunk_overlap.value = config.max_chunk_size.value;
        assert!(config.validate().is_err());
    }
}
