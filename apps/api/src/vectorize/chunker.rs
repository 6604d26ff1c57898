use serde::{Deserialize, Serialize};

use crate::vectorize::VectorizeError;

/// One overlapping window of text. Offsets are in characters, not bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
    pub start_char: usize,
    pub end_char: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

impl ChunkConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, VectorizeError> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(VectorizeError::InvalidConfig(format!(
                "overlap ({overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Number of chunks `chunk_text` produces for a text of `char_len` characters.
pub fn estimate_chunk_count(char_len: usize, config: ChunkConfig) -> usize {
    if char_len == 0 {
        0
    } else if char_len <= config.chunk_size {
        1
    } else {
        1 + (char_len - config.chunk_size).div_ceil(config.step())
    }
}

/// Splits `text` into windows of `chunk_size` characters, each starting
/// `chunk_size - overlap` characters after the previous one. The last window
/// ends exactly at the end of the text.
pub fn chunk_text(text: &str, config: ChunkConfig) -> Vec<TextChunk> {
    // Byte offset of every char boundary, including the end of the string.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = boundaries.len() - 1;

    let mut chunks = Vec::with_capacity(estimate_chunk_count(char_len, config));
    let mut start = 0;
    while start < char_len {
        let end = (start + config.chunk_size).min(char_len);
        chunks.push(TextChunk {
            index: chunks.len(),
            text: text[boundaries[start]..boundaries[end]].to_string(),
            start_char: start,
            end_char: end,
        });
        if end == char_len {
            break;
        }
        start += config.step();
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> String {
        // Non-repeating-ish content so misaligned overlaps would be caught.
        (0..len)
            .map(|i| char::from(b'a' + ((i * 7 + i / 26) % 26) as u8))
            .collect()
    }

    #[test]
    fn test_overlaps_identical_and_reconstruct_original() {
        let config = ChunkConfig::default();
        let text = sample(10_000);
        let chunks = chunk_text(&text, config);

        for pair in chunks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let prev_tail: String = prev.text.chars().skip(config.chunk_size - config.overlap).collect();
            let next_head: String = next.text.chars().take(config.overlap).collect();
            assert_eq!(prev_tail, next_head);
        }

        let mut rebuilt = chunks[0].text.clone();
        for chunk in &chunks[1..] {
            let overlap_with_prev = chunks[chunk.index - 1].end_char - chunk.start_char;
            rebuilt.extend(chunk.text.chars().skip(overlap_with_prev));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_estimate_matches_actual_count() {
        let config = ChunkConfig::default();
        for len in [0, 1, 999, 1000, 1001, 1800, 1801, 10_000, 12_345] {
            let chunks = chunk_text(&sample(len), config);
            assert_eq!(chunks.len(), estimate_chunk_count(len, config), "len={len}");
        }
        assert_eq!(estimate_chunk_count(10_000, config), 13);
    }

    #[test]
    fn test_multibyte_text_split_on_char_boundaries() {
        let text = "§é漢".repeat(500);
        let chunks = chunk_text(&text, ChunkConfig::new(100, 20).unwrap());
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 100));
        assert_eq!(chunks.last().unwrap().end_char, 1500);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunk_text("", ChunkConfig::default()).is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(ChunkConfig::new(100, 100).is_err());
        assert!(ChunkConfig::new(0, 0).is_err());
        assert!(ChunkConfig::new(100, 99).is_ok());
    }
}
