use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::DocumentIndex;
use crate::models::{Channel, RetrievalHit};

#[derive(Debug, Deserialize)]
struct RawHit {
    id: String,
    content: String,
    #[serde(default)]
    meta: serde_json::Value,
    score: f32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<RawHit>,
}

/// HTTP client for the namespaced document index service.
pub struct VectorDbClient {
    client: reqwest::Client,
    base_url: String,
}

impl VectorDbClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn search(&self, path: &str, body: serde_json::Value, channel: Channel) -> Result<Vec<RetrievalHit>> {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .context("index search request failed")?
            .error_for_status()
            .context("index service returned an error status")?;

        let data: SearchResponse = resp
            .json()
            .await
            .context("failed to parse index search response")?;

        Ok(data
            .hits
            .into_iter()
            .map(|h| RetrievalHit {
                id: h.id,
                content: h.content,
                meta: h.meta,
                score: h.score,
                channel,
            })
            .collect())
    }
}

#[async_trait]
impl DocumentIndex for VectorDbClient {
    async fn vector_search(
        &self,
        namespace: &str,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievalHit>> {
        let body = json!({ "namespace": namespace, "vector": query, "k": k });
        self.search("/search/vector", body, Channel::Vector).await
    }

    async fn keyword_search(
        &self,
        namespace: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievalHit>> {
        let body = json!({ "namespace": namespace, "query": query, "k": k });
        self.search("/search/keyword", body, Channel::Keyword).await
    }

    async fn insert_chunk(
        &self,
        namespace: &str,
        content: &str,
        meta: serde_json::Value,
        embedding: &[f32],
    ) -> Result<()> {
        let body = json!({
            "namespace": namespace,
            "content": content,
            "meta": meta,
            "embedding": embedding,
        });
        self.client
            .post(format!("{}/index/add", self.base_url))
            .json(&body)
            .send()
            .await
            .context("index add request failed")?
            .error_for_status()
            .context("index service rejected the chunk")?;
        Ok(())
    }
}
