//! In-memory collection for tests and throwaway sessions.

use crate::embeddings::EmbeddingProvider;
use crate::types::{ChunkMetadata, RetrievedChunk};
use crate::vector_index::{
    check_parallel, rank, sanitize_collection_name, DistanceMetric, VectorIndex,
};
use qa_core::{AppError, AppResult};
use std::sync::{Arc, RwLock};

struct StoredChunk {
    id: String,
    text: String,
    metadata: ChunkMetadata,
    vector: Vec<f32>,
}

/// Brute-force collection held in a `Vec` behind a `RwLock`.
pub struct InMemoryCollection {
    name: String,
    metric: DistanceMetric,
    embedder: Arc<dyn EmbeddingProvider>,
    chunks: RwLock<Vec<StoredChunk>>,
}

impl InMemoryCollection {
    pub fn new(name: &str, metric: DistanceMetric, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            name: sanitize_collection_name(name),
            metric,
            embedder,
            chunks: RwLock::new(Vec::new()),
        }
    }
}

fn poisoned<T>(_: T) -> AppError {
    AppError::Knowledge("In-memory index lock poisoned".to_string())
}

#[async_trait::async_trait]
impl VectorIndex for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }

    async fn add(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[ChunkMetadata],
    ) -> AppResult<()> {
        check_parallel(ids, documents, metadatas)?;
        let vectors = self.embedder.embed_batch(documents).await?;

        let mut chunks = self.chunks.write().map_err(poisoned)?;
        for (((id, text), metadata), vector) in
            ids.iter().zip(documents).zip(metadatas).zip(vectors)
        {
            let stored = StoredChunk {
                id: id.clone(),
                text: text.clone(),
                metadata: metadata.clone(),
                vector,
            };
            match chunks.iter_mut().find(|c| c.id == *id) {
                Some(existing) => *existing = stored,
                None => chunks.push(stored),
            }
        }
        Ok(())
    }

    async fn query(&self, text: &str, top_k: usize) -> AppResult<Vec<RetrievedChunk>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let query = self.embedder.embed(text).await?;

        let chunks = self.chunks.read().map_err(poisoned)?;
        let hits = chunks
            .iter()
            .map(|c| RetrievedChunk {
                id: c.id.clone(),
                text: c.text.clone(),
                metadata: c.metadata.clone(),
                distance: self.metric.distance(&query, &c.vector),
            })
            .collect();
        Ok(rank(hits, top_k))
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.chunks.read().map_err(poisoned)?.len())
    }

    async fn reset(&self) -> AppResult<()> {
        self.chunks.write().map_err(poisoned)?.clear();
        Ok(())
    }
}
