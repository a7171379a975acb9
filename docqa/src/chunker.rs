use crate::error::ApiError;
use crate::models::Chunk;

/// Split extracted document text into overlapping windows.
///
/// Windows are measured in characters, not bytes, so multibyte text never
/// splits a code point. Every chunk except possibly the last has length
/// exactly `size`, and consecutive chunks share exactly `overlap`
/// characters. Requires `overlap < size`; the window would stop advancing
/// otherwise.
pub fn chunk(text: &str, size: usize, overlap: usize) -> Result<Vec<Chunk>, ApiError> {
    if size == 0 {
        return Err(ApiError::InvalidConfig(
            "chunk size must be greater than zero".to_string(),
        ));
    }
    if overlap >= size {
        return Err(ApiError::InvalidConfig(format!(
            "chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, size
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Ok(Vec::new());
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;
    loop {
        let end = (start + size).min(chars.len());
        chunks.push(Chunk {
            text: chars[start..end].iter().collect(),
            index,
        });
        if end == chars.len() {
            break;
        }
        start = end - overlap;
        index += 1;
    }

    Ok(chunks)
}
