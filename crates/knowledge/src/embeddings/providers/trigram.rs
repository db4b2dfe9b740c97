//! Hashed word and character-trigram embeddings.

use crate::embeddings::provider::EmbeddingProvider;
use qa_core::AppResult;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

/// Deterministic offline embedder.
///
/// Each distinct term contributes its frequency to one hashed dimension and
/// the square root of its frequency to one dimension per character trigram.
/// Vectors are unit length (or all zero for text without terms). Lexical
/// overlap drives similarity, which is enough to rank documentation for a
/// feature name or identifier.
#[derive(Debug, Clone)]
pub struct TrigramEmbedder {
    dimensions: usize,
}

fn stop_words() -> &'static HashSet<&'static str> {
    static WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    WORDS.get_or_init(|| {
        [
            "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for",
            "to", "of", "in", "and", "or", "but", "with", "by", "from", "this", "that", "be",
            "have", "has", "had", "it", "its", "their", "they", "them", "should", "when",
        ]
        .into_iter()
        .collect()
    })
}

fn hash_bytes(bytes: impl Iterator<Item = u8>, multiplier: u64) -> u64 {
    bytes.fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64))
}

impl TrigramEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Lowercased alphanumeric terms of at least two chars, minus stop words.
    fn terms(text: &str) -> BTreeMap<String, u32> {
        let lower = text.to_lowercase();
        let mut freq = BTreeMap::new();
        for term in lower
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|t| t.chars().count() >= 2 && !stop_words().contains(t))
        {
            *freq.entry(term.to_string()).or_insert(0) += 1;
        }
        freq
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let dims = self.dimensions as u64;

        for (term, count) in Self::terms(text) {
            let count = count as f32;

            let padded: Vec<char> = format!(" {} ", term).chars().collect();
            for window in padded.windows(3) {
                let gram: String = window.iter().collect();
                let h = hash_bytes(gram.bytes(), 37);
                vector[(h % dims) as usize] += count.sqrt();
            }

            let h = hash_bytes(term.bytes(), 31);
            vector[(h % dims) as usize] += count;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramEmbedder {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn test_unit_length_and_deterministic() {
        let embedder = TrigramEmbedder::new(384);
        let a = embedder.embed("Apply discount code SAVE15").await.unwrap();
        let b = embedder.embed("Apply discount code SAVE15").await.unwrap();

        assert_eq!(a.len(), 384);
        assert!((norm(&a) - 1.0).abs() < 1e-3);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let embedder = TrigramEmbedder::new(64);
        let texts = vec!["shipping express".to_string(), "payment".to_string()];
        let batch = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], embedder.embed("payment").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let embedder = TrigramEmbedder::new(384);
        let v = embedder.embed("   the a of ").await.unwrap();
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_related_text_scores_higher() {
        let embedder = TrigramEmbedder::new(384);
        let query = embedder.embed("discount code").await.unwrap();
        let related = embedder
            .embed("The discount code SAVE15 applies a 15% discount.")
            .await
            .unwrap();
        let unrelated = embedder
            .embed("Express shipping costs $10 and arrives tomorrow.")
            .await
            .unwrap();

        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_non_ascii_text() {
        let embedder = TrigramEmbedder::new(384);
        let v = embedder.embed("Código de desconto é válido 🎮").await.unwrap();
        assert!((norm(&v) - 1.0).abs() < 1e-3);
    }
}
