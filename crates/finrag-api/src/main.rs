use std::env;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use finrag_core::chunk::ChunkerConfig;
use finrag_core::config::FinragConfig;
use finrag_llm::ollama::{OllamaEmbedder, OllamaGenerator};
use finrag_llm::ports::{Embedder, Generator};
use finrag_retrieval::answer::RetrievalConfig;
use finrag_retrieval::session::DocumentSession;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finrag_api::router::create_router;
use finrag_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finrag_api=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = env::var("FINRAG_PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3001);

    let mut config = FinragConfig::with_defaults();
    if let Ok(path) = env::var("FINRAG_CONFIG") {
        config = config.load_from_file(&path)?;
    }
    let config = config.load_from_env();
    config.validate()?;

    tracing::info!(
        port = port,
        embedder_model = %config.embedder_model.value,
        embedder_dim = config.embedder_dimensions.value,
        generator_model = %config.generator_model.value,
        "Starting FinRAG API server"
    );

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

    let session = Arc::new(DocumentSession::new(
        embedder,
        generator,
        chunker_config,
        retrieval_config,
    ));
    let state = Arc::new(AppState::new(session));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin("*".parse::<HeaderValue>()?);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
