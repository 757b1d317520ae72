//! Command implementations

mod ask;
mod chat;
mod inspect;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use finrag_core::chunk::ChunkerConfig;
use finrag_core::config::{CliConfigOverrides, FinragConfig};
use finrag_llm::ollama::{OllamaEmbedder, OllamaGenerator};
use finrag_llm::ports::{Embedder, Generator};
use finrag_retrieval::answer::RetrievalConfig;
use finrag_retrieval::session::DocumentSession;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    let overrides = match &cli.command {
        Commands::Ask(args) => CliConfigOverrides {
            top_k: args.top_k,
            relevance_floor: args.floor,
            ..Default::default()
        },
        _ => CliConfigOverrides::default(),
    };
    let config = load_config(&cli, overrides)?;

    match &cli.command {
        Commands::Inspect(args) => inspect::execute(args, &output, &config),
        Commands::Ask(args) => ask::execute(args, &output, &config),
        Commands::Chat(args) => chat::execute(args, &output, &config),
    }
}

fn load_config(cli: &Cli, overrides: CliConfigOverrides) -> Result<FinragConfig> {
    let mut config = FinragConfig::with_defaults();
    if let Some(ref path) = cli.config {
        config = config.load_from_file(path)?;
    }
    let mut config = config.load_from_env();
    config.update_from_cli(overrides);
    config.validate()?;
    Ok(config)
}

/// Build a document session with Ollama collaborators from configuration.
pub(crate) fn build_session(config: &FinragConfig) -> Result<DocumentSession> {
    let embedder: Arc<dyn Embedder> = Arc::new(OllamaEmbedder::new(
        config.ollama_url.value.clone(),
        config.embedder_model.value.clone(),
        config.embedder_dimensions.value,
    ));
    let generator: Arc<dyn Generator> = Arc::new(OllamaGenerator::new(
        config.ollama_url.value.clone(),
        config.generator_model.value.clone(),
        Duration::from_secs(config.generation_timeout_secs.value),
    ));

    let chunker_config =
        ChunkerConfig::with_window(config.max_chunk_size.value, config.chunk_overlap.value)?;
    let retrieval_config = RetrievalConfig {
        top_k: config.top_k.value,
        relevance_floor: config.relevance_floor.value,
        max_context_chars: config.max_context_chars.value,
    };

    Ok(DocumentSession::new(embedder, generator, chunker_config, retrieval_config))
}
