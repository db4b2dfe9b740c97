//! Vector index abstraction for knowledge chunks.
//!
//! A collection owns its embedding function: callers hand it text and get
//! text back, ranked most similar first.

use crate::types::{ChunkMetadata, RetrievedChunk};
use qa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Distance function used to rank results (lower is closer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// `1 - cosine similarity`; zero vectors are at distance 1
    #[default]
    Cosine,
    /// Euclidean distance
    L2,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::L2 => "l2",
        }
    }

    pub fn parse(s: &str) -> AppResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "l2" => Ok(Self::L2),
            other => Err(AppError::Knowledge(format!(
                "Unknown distance metric: {}",
                other
            ))),
        }
    }

    /// Distance between two vectors. Mismatched lengths are maximally far.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return f32::MAX;
        }
        match self {
            Self::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
                    1.0
                } else {
                    1.0 - dot / (norm_a * norm_b)
                }
            }
            Self::L2 => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }
}

/// Similarity-search collection of text chunks.
///
/// Methods take `&self`; implementations serialise their own writes.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Sanitised collection name.
    fn name(&self) -> &str;

    fn metric(&self) -> DistanceMetric;

    /// Embed and store chunks. An existing id is replaced.
    ///
    /// The three slices are parallel and must have equal length.
    async fn add(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[ChunkMetadata],
    ) -> AppResult<()>;

    /// Up to `top_k` chunks nearest to `text`, closest first. Equal
    /// distances keep insertion order.
    async fn query(&self, text: &str, top_k: usize) -> AppResult<Vec<RetrievedChunk>>;

    /// Number of stored chunks.
    async fn count(&self) -> AppResult<usize>;

    /// Remove every chunk from the collection.
    async fn reset(&self) -> AppResult<()>;
}

/// Collection name restricted to lowercase ASCII alphanumerics, starting
/// with a letter.
pub fn sanitize_collection_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    match cleaned.chars().next() {
        None => "kbdefault".to_string(),
        Some(c) if !c.is_ascii_alphabetic() => format!("kb{}", cleaned),
        Some(_) => cleaned,
    }
}

/// Reject parallel slices of different lengths.
pub(crate) fn check_parallel(
    ids: &[String],
    documents: &[String],
    metadatas: &[ChunkMetadata],
) -> AppResult<()> {
    if ids.len() != documents.len() || ids.len() != metadatas.len() {
        return Err(AppError::Knowledge(format!(
            "Mismatched add: {} ids, {} documents, {} metadatas",
            ids.len(),
            documents.len(),
            metadatas.len()
        )));
    }
    Ok(())
}

/// Stable sort by ascending distance, then truncate.
pub(crate) fn rank(mut hits: Vec<RetrievedChunk>, top_k: usize) -> Vec<RetrievedChunk> {
    hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
    hits.truncate(top_k);
    hits
}
