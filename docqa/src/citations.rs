use serde_json::Value;

use crate::models::RetrievalHit;

const UNKNOWN_SOURCE: &str = "unknown";

/// Render the human-readable source list appended to every answer.
///
/// One `[i]label:position` entry per result, 1-indexed, space-separated.
/// Label comes from `meta.source` or `meta.title`, position from
/// `meta.page` or `meta.chunk_index`; missing fields fall back to a
/// placeholder so the label is never empty.
pub fn build_citations(results: &[RetrievalHit]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, hit)| format!("[{}]{}:{}", i + 1, label_of(&hit.meta), position_of(&hit.meta)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn label_of(meta: &Value) -> &str {
    meta.get("source")
        .or_else(|| meta.get("title"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_SOURCE)
}

fn position_of(meta: &Value) -> i64 {
    meta.get("page")
        .or_else(|| meta.get("chunk_index"))
        .and_then(Value::as_i64)
        .unwrap_or(0)
}
