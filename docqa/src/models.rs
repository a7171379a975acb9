use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A contiguous slice of an extracted document, produced by the chunker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub index: usize,
}

/// Which retrieval channel produced a hit.
///
/// Scores are channel-local: vector similarity and keyword rank live on
/// different scales and are compared raw during fusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Vector,
    Keyword,
}

/// One candidate result from one retrieval channel.
///
/// `id` is the stable identity of the stored chunk; after fusion no two
/// hits in a result set share an `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub meta: serde_json::Value,
    pub score: f32,
    pub channel: Channel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of per-user conversational history, externally owned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Final pipeline output: answer text (citations appended) plus the
/// context that grounded it, in rank order.
#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub text: String,
    pub used_context: Vec<RetrievalHit>,
}

// API request/response models

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub document_id: Uuid,
    pub title: String,
    pub chunk_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub request_id: Uuid,
    pub answer: String,
}
