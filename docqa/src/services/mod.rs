pub mod embedding;
pub mod generation;
pub mod store;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{MemoryEntry, RetrievalHit, Role};

/// Text-in, vector-out embedding service.
#[async_trait]
pub trait Embeddings: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Chat-completion service. Only the textual payload is consumed.
#[async_trait]
pub trait Generation: Send + Sync {
    async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String>;
}

/// Namespaced document index with independent semantic and lexical queries.
///
/// Hit scores are channel-local and not comparable across the two search
/// methods; the retriever tolerates that during fusion.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    async fn vector_search(
        &self,
        namespace: &str,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievalHit>>;

    async fn keyword_search(
        &self,
        namespace: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievalHit>>;

    async fn insert_chunk(
        &self,
        namespace: &str,
        content: &str,
        meta: serde_json::Value,
        embedding: &[f32],
    ) -> Result<()>;
}

/// Append-only per-user conversational history.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Most recent entries, newest first.
    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<MemoryEntry>>;

    async fn append(&self, user_id: &str, role: Role, content: &str) -> Result<()>;
}
