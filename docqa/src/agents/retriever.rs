use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::RetrievalHit;
use crate::services::{DocumentIndex, Embeddings};

/// Merge the two channels into one deduplicated, score-sorted list.
///
/// Vector hits are considered first; on a duplicate `id` the strictly
/// higher score wins, so an exact tie keeps the vector variant. Scores
/// are compared raw across channels even though the scales differ
/// (vector similarity vs. keyword rank).
pub fn fuse(
    vector_hits: Vec<RetrievalHit>,
    keyword_hits: Vec<RetrievalHit>,
    limit: usize,
) -> Vec<RetrievalHit> {
    let mut merged: Vec<RetrievalHit> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();

    for hit in vector_hits.into_iter().chain(keyword_hits) {
        match index_by_id.get(&hit.id) {
            Some(&i) => {
                if hit.score > merged[i].score {
                    merged[i] = hit;
                }
            }
            None => {
                index_by_id.insert(hit.id.clone(), merged.len());
                merged.push(hit);
            }
        }
    }

    // Stable sort keeps first-encountered order among equal scores.
    merged.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    merged.truncate(limit);
    merged
}

/// Keep the longest prefix whose cumulative content length stays within
/// `max_chars`. Items are never split; an oversized first item yields an
/// empty window.
pub fn pack(results: Vec<RetrievalHit>, max_chars: usize) -> Vec<RetrievalHit> {
    let mut used = 0usize;
    let mut window = Vec::new();
    for hit in results {
        let len = hit.content.chars().count();
        if used + len > max_chars {
            break;
        }
        used += len;
        window.push(hit);
    }
    window
}

/// Hybrid retrieval over one document-store namespace: both channels are
/// queried concurrently, a failed channel degrades to no hits, and the
/// fused result is packed to the context budget.
pub struct Retriever {
    embeddings: Arc<dyn Embeddings>,
    index: Arc<dyn DocumentIndex>,
    k: usize,
    fusion_limit: usize,
    context_max_chars: usize,
}

impl Retriever {
    pub fn new(
        embeddings: Arc<dyn Embeddings>,
        index: Arc<dyn DocumentIndex>,
        k: usize,
        fusion_limit: usize,
        context_max_chars: usize,
    ) -> Self {
        Self {
            embeddings,
            index,
            k,
            fusion_limit,
            context_max_chars,
        }
    }

    pub async fn retrieve(&self, namespace: &str, question: &str) -> Vec<RetrievalHit> {
        let vector_channel = async {
            let query = match self.embeddings.embed(question).await {
                Ok(v) => v,
                Err(e) => {
                    warn!(namespace, error = %e, "embedding failed, vector channel empty");
                    return Vec::new();
                }
            };
            match self.index.vector_search(namespace, &query, self.k).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(namespace, error = %e, "vector search failed, channel empty");
                    Vec::new()
                }
            }
        };

        let keyword_channel = async {
            match self.index.keyword_search(namespace, question, self.k).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(namespace, error = %e, "keyword search failed, channel empty");
                    Vec::new()
                }
            }
        };

        let (vector_hits, keyword_hits) = tokio::join!(vector_channel, keyword_channel);
        debug!(
            namespace,
            vector = vector_hits.len(),
            keyword = keyword_hits.len(),
            "channel results"
        );

        pack(
            fuse(vector_hits, keyword_hits, self.fusion_limit),
            self.context_max_chars,
        )
    }
}
