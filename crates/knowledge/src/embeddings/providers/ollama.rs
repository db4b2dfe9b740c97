//! Ollama embedding provider.
//!
//! Calls `POST <base_url>/api/embeddings` once per text with
//! `{model, prompt}` and expects `{embedding: [f32]}` back. Failures are not
//! retried.

use crate::embeddings::provider::EmbeddingProvider;
use async_trait::async_trait;
use qa_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Embedding provider backed by a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaEmbedder {
    /// Create an embedder. No request is made until the first embedding.
    pub fn new(
        base_url: &str,
        model: &str,
        dimensions: usize,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Knowledge(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
        })
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), model = %self.model))]
    async fn embed_one(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Knowledge(format!("Embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(AppError::Knowledge(format!(
                "Ollama embeddings error ({}): {}",
                status, message
            )));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::Knowledge(format!("Failed to parse embedding response: {}", e))
        })?;

        if body.embedding.len() != self.dimensions {
            return Err(AppError::Knowledge(format!(
                "Unexpected embedding dimensions: got {}, expected {}",
                body.embedding.len(),
                self.dimensions
            )));
        }

        Ok(body.embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        debug!("Embedding batch of {} texts", texts.len());

        // The endpoint takes one prompt per request.
        let mut embeddings = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                warn!("Empty text at index {}, using zero vector", i);
                embeddings.push(vec![0.0; self.dimensions]);
                continue;
            }
            embeddings.push(self.embed_one(text).await?);
        }
        Ok(embeddings)
    }
}
