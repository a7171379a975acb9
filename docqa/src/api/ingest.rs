use std::sync::Arc;

use bytes::Buf;
use futures::TryStreamExt;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;
use warp::multipart::FormData;
use warp::{Rejection, Reply};

use crate::chunker::chunk;
use crate::error::ApiError;
use crate::models::IngestResponse;
use crate::services::{DocumentIndex, Embeddings};

/// Ingestion path: extract text externally, chunk, embed, index.
pub struct Ingestor {
    client: reqwest::Client,
    extraction_url: String,
    embeddings: Arc<dyn Embeddings>,
    index: Arc<dyn DocumentIndex>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Ingestor {
    pub fn new(
        client: reqwest::Client,
        extraction_url: &str,
        embeddings: Arc<dyn Embeddings>,
        index: Arc<dyn DocumentIndex>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            client,
            extraction_url: extraction_url.trim_end_matches('/').to_string(),
            embeddings,
            index,
            chunk_size,
            chunk_overlap,
        }
    }

    async fn extract_text(&self, filename: &str, file_bytes: Vec<u8>) -> Result<String, ApiError> {
        let part = reqwest::multipart::Part::bytes(file_bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .client
            .post(format!("{}/extract", self.extraction_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("extraction request failed: {}", e)))?;

        let data: Value = resp
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("extraction response unreadable: {}", e)))?;

        let text = data["text"]
            .as_str()
            .ok_or_else(|| ApiError::Upstream("extraction response missing text".to_string()))?;
        Ok(text.to_string())
    }

    pub async fn ingest(
        &self,
        namespace: &str,
        title: &str,
        filename: &str,
        file_bytes: Vec<u8>,
    ) -> Result<IngestResponse, ApiError> {
        let document_id = Uuid::new_v4();
        let text = self.extract_text(filename, file_bytes).await?;
        let chunks = chunk(&text, self.chunk_size, self.chunk_overlap)?;

        for c in &chunks {
            let embedding = self
                .embeddings
                .embed(&c.text)
                .await
                .map_err(|e| ApiError::Upstream(e.to_string()))?;
            let meta = json!({
                "source": title,
                "document_id": document_id.to_string(),
                "chunk_index": c.index,
            });
            self.index
                .insert_chunk(namespace, &c.text, meta, &embedding)
                .await
                .map_err(|e| ApiError::Upstream(e.to_string()))?;
        }

        info!(
            %document_id,
            namespace,
            title,
            chunk_count = chunks.len(),
            "document ingested"
        );

        Ok(IngestResponse {
            document_id,
            title: title.to_string(),
            chunk_count: chunks.len(),
        })
    }
}

pub async fn handle_ingest(
    mut form: FormData,
    ingestor: Arc<Ingestor>,
) -> Result<impl Reply, Rejection> {
    let mut filename = String::from("unknown");
    let mut file_bytes = Vec::new();
    let mut namespace = None;
    let mut title = None;

    while let Ok(Some(part)) = form.try_next().await {
        let name = part.name().to_string();
        match name.as_str() {
            "file" => {
                filename = part.filename().unwrap_or("unknown").to_string();
                file_bytes = read_part(part).await?;
            }
            "namespace" => {
                namespace = Some(read_part_string(part).await?);
            }
            "title" => {
                title = Some(read_part_string(part).await?);
            }
            _ => {}
        }
    }

    if file_bytes.is_empty() {
        return Err(warp::reject::custom(ApiError::BadRequest(
            "missing file".to_string(),
        )));
    }
    let namespace = namespace
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| {
            warp::reject::custom(ApiError::BadRequest("missing namespace".to_string()))
        })?;
    let title = title.unwrap_or_else(|| filename.clone());

    let response = ingestor
        .ingest(&namespace, &title, &filename, file_bytes)
        .await
        .map_err(warp::reject::custom)?;

    Ok(warp::reply::json(&response))
}

async fn read_part(part: warp::multipart::Part) -> Result<Vec<u8>, Rejection> {
    part.stream()
        .try_fold(Vec::new(), |mut vec, data| async move {
            vec.extend_from_slice(data.chunk());
            Ok(vec)
        })
        .await
        .map_err(|_| {
            warp::reject::custom(ApiError::BadRequest(
                "unreadable multipart body".to_string(),
            ))
        })
}

async fn read_part_string(part: warp::multipart::Part) -> Result<String, Rejection> {
    let bytes = read_part(part).await?;
    String::from_utf8(bytes).map_err(|_| {
        warp::reject::custom(ApiError::BadRequest(
            "multipart field is not UTF-8".to_string(),
        ))
    })
}
