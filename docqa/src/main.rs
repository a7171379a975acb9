use std::sync::Arc;

use tracing::info;
use warp::Filter;

use docqa::agents::generator::Generator;
use docqa::agents::retriever::Retriever;
use docqa::agents::router::Router;
use docqa::agents::verifier::Verifier;
use docqa::api::{self, Ingestor};
use docqa::memory::RedisMemory;
use docqa::pipeline::Pipeline;
use docqa::services::embedding::EmbeddingClient;
use docqa::services::generation::GenerationClient;
use docqa::services::store::VectorDbClient;
use docqa::services::{ConversationStore, DocumentIndex, Embeddings, Generation};
use docqa::{config, error, middleware};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("Starting document QA orchestrator");

    let config = config::Config::from_env()?;
    info!("Configuration loaded");

    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()?;

    let memory: Arc<dyn ConversationStore> = Arc::new(RedisMemory::new(&config.redis_url).await?);
    info!("Redis connection established");

    let embeddings: Arc<dyn Embeddings> = Arc::new(EmbeddingClient::new(
        http.clone(),
        &config.embedding_service_url,
    ));
    let index: Arc<dyn DocumentIndex> = Arc::new(VectorDbClient::new(
        http.clone(),
        &config.vector_db_service_url,
    ));
    let llm: Arc<dyn Generation> = Arc::new(GenerationClient::new(
        http.clone(),
        &config.generation_service_url,
        &config.generation_model,
        config.generation_api_key.clone(),
    ));

    let pipeline = Arc::new(Pipeline::new(
        Router::new(llm.clone()),
        Retriever::new(
            embeddings.clone(),
            index.clone(),
            config.retrieval_k,
            config.fusion_limit,
            config.context_max_chars,
        ),
        Generator::new(llm.clone()),
        Verifier::new(llm),
        memory,
        config.memory_limit,
    ));

    let ingestor = Arc::new(Ingestor::new(
        http,
        &config.ingestion_service_url,
        embeddings,
        index,
        config.chunk_size,
        config.chunk_overlap,
    ));

    let api_routes = api::routes(pipeline, ingestor)
        .recover(error::handle_rejection)
        .with(warp::log("api"))
        .with(middleware::cors());

    // Health check route
    let system_name = config.system_name.clone();
    let health = warp::path("health").and(warp::get()).map(move || {
        warp::reply::json(&serde_json::json!({
            "status": "ok",
            "system": system_name,
        }))
    });

    // Metrics route
    let metrics = warp::path("metrics").and(warp::get()).map(|| {
        use prometheus::{Encoder, TextEncoder};
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer).unwrap();
        warp::reply::with_header(buffer, "Content-Type", encoder.format_type())
    });

    let routes = health.or(metrics).or(api_routes);

    let addr = ([0, 0, 0, 0], config.port);
    info!("Server listening on {}", addr.1);

    warp::serve(routes).run(addr).await;

    Ok(())
}
