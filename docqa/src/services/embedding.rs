use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use super::Embeddings;

/// HTTP client for the embedding service (`POST {base}/embed`).
pub struct EmbeddingClient {
    client: reqwest::Client,
    base_url: String,
}

impl EmbeddingClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Embeddings for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = json!({ "texts": [text] });
        let resp = self
            .client
            .post(format!("{}/embed", self.base_url))
            .json(&body)
            .send()
            .await
            .context("embedding request failed")?
            .error_for_status()
            .context("embedding service returned an error status")?;

        let data: Value = resp
            .json()
            .await
            .context("failed to parse embedding response")?;

        let vector = data["embeddings"]
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("embedding response missing embeddings[0]"))?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        Ok(vector)
    }
}
