//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::{OllamaEmbedder, TrigramEmbedder};
use qa_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Timeout for a single embedding request.
const EMBEDDING_TIMEOUT_SECS: u64 = 30;

/// Turns text into fixed-length vectors.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Provider name (e.g. "trigram", "ollama")
    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;

    fn dimensions(&self) -> usize;

    /// Embed several texts, one vector per input in order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Knowledge("No embedding returned".to_string()))
    }
}

/// Create the embedding provider named in `config`.
pub fn create_provider(config: &EmbeddingConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    if config.dimensions == 0 {
        return Err(AppError::Config(
            "Embedding dimensions must be positive".to_string(),
        ));
    }

    match config.provider.as_str() {
        "trigram" => Ok(Arc::new(TrigramEmbedder::new(config.dimensions))),

        "ollama" => {
            let base_url = config
                .endpoint
                .as_deref()
                .unwrap_or(qa_core::config::DEFAULT_ENDPOINT);
            let embedder = OllamaEmbedder::new(
                base_url,
                &config.model,
                config.dimensions,
                Duration::from_secs(EMBEDDING_TIMEOUT_SECS),
            )?;
            Ok(Arc::new(embedder))
        }

        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama",
            other
        ))),
    }
}
