//! `Chunker`: `(aggregatedText) -> [{index, total, content, tokens, pagesIncluded}]`.

use async_trait::async_trait;

use crate::models::PendingChunk;

#[async_trait]
pub trait Chunker: Send + Sync {
    async fn chunk(&self, aggregated_text: &str) -> anyhow::Result<Vec<PendingChunk>>;
}

/// Fixed-size splitter: cuts `aggregated_text` into roughly
/// `chars_per_chunk`-sized pieces on whitespace boundaries. Token count is
/// approximated at 4 characters/token, a common rough heuristic; chunking
/// *strategy* (semantic boundaries, sentence-aware splitting) is out of
/// core scope per spec §1.
pub struct FixedSizeChunker {
    chars_per_chunk: usize,
}

impl Default for FixedSizeChunker {
    fn default() -> Self {
        Self { chars_per_chunk: 6000 }
    }
}

impl FixedSizeChunker {
    pub fn new(chars_per_chunk: usize) -> Self {
        Self { chars_per_chunk: chars_per_chunk.max(1) }
    }
}

#[async_trait]
impl Chunker for FixedSizeChunker {
    async fn chunk(&self, aggregated_text: &str) -> anyhow::Result<Vec<PendingChunk>> {
        let trimmed = aggregated_text.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let words: Vec<&str> = trimmed.split_whitespace().collect();
        let mut pieces: Vec<String> = Vec::new();
        let mut current = String::new();
        for word in words {
            if !current.is_empty() && current.len() + word.len() + 1 > self.chars_per_chunk {
                pieces.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            pieces.push(current);
        }

        let total = pieces.len() as i32;
        Ok(pieces
            .into_iter()
            .enumerate()
            .map(|(i, content)| PendingChunk {
                index: i as i32,
                total,
                tokens: (content.len() / 4) as i32,
                content,
                pages_included: Vec::new(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_text_yields_no_chunks() {
        let chunker = FixedSizeChunker::default();
        let chunks = chunker.chunk("   ").await.unwrap();
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn splits_long_text_into_multiple_chunks_with_correct_totals() {
        let chunker = FixedSizeChunker::new(20);
        let text = "one two three four five six seven eight nine ten";
        let chunks = chunker.chunk(text).await.unwrap();
        assert!(chunks.len() > 1);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i as i32);
            assert_eq!(c.total, chunks.len() as i32);
        }
    }
}
