use anyhow::{bail, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub system_name: String,
    pub redis_url: String,
    pub ingestion_service_url: String,
    pub embedding_service_url: String,
    pub vector_db_service_url: String,
    pub generation_service_url: String,
    pub generation_api_key: Option<String>,
    pub generation_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub fusion_limit: usize,
    pub context_max_chars: usize,
    pub retrieval_k: usize,
    pub memory_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            system_name: std::env::var("SYSTEM_NAME")
                .unwrap_or_else(|_| "docqa".to_string()),
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            ingestion_service_url: std::env::var("INGESTION_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            embedding_service_url: std::env::var("EMBEDDING_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8002".to_string()),
            vector_db_service_url: std::env::var("VECTOR_DB_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8003".to_string()),
            generation_service_url: std::env::var("GENERATION_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8004/v1".to_string()),
            generation_api_key: std::env::var("GENERATION_API_KEY").ok(),
            generation_model: std::env::var("GENERATION_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            chunk_size: env_usize("CHUNK_SIZE", 1200)?,
            chunk_overlap: env_usize("CHUNK_OVERLAP", 200)?,
            fusion_limit: env_usize("FUSION_LIMIT", 8)?,
            context_max_chars: env_usize("CONTEXT_MAX_CHARS", 8000)?,
            retrieval_k: env_usize("RETRIEVAL_K", 8)?,
            memory_limit: env_usize("MEMORY_LIMIT", 10)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("CHUNK_SIZE must be greater than zero");
        }
        if self.chunk_overlap >= self.chunk_size {
            bail!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        Ok(())
    }
}

fn env_usize(key: &str, default: usize) -> Result<usize> {
    match std::env::var(key) {
        Ok(raw) => Ok(raw.parse()?),
        Err(_) => Ok(default),
    }
}
