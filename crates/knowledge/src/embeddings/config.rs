//! Embedding configuration recorded with each knowledge base.

use qa_core::config::AppConfig;
use qa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Which embedding function a collection was built with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Base URL for network providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

impl EmbeddingConfig {
    /// Derive the embedding config from application settings. Network
    /// providers share the generation endpoint.
    pub fn from_app_config(config: &AppConfig) -> Self {
        let knowledge = &config.knowledge;
        let endpoint = (knowledge.embedding_provider == "ollama")
            .then(|| config.generation.endpoint.clone());

        Self {
            provider: knowledge.embedding_provider.clone(),
            model: knowledge.embedding_model.clone(),
            dimensions: knowledge.embedding_dim,
            endpoint,
        }
    }

    /// Check that `other` embeds into the same vector space as `self`.
    ///
    /// The endpoint is not compared; the same model served elsewhere is fine.
    pub fn validate_consistency(&self, other: &Self) -> AppResult<()> {
        if self.provider != other.provider {
            return Err(AppError::Knowledge(format!(
                "Provider mismatch: index built with '{}', configured '{}'",
                self.provider, other.provider
            )));
        }

        if self.model != other.model {
            return Err(AppError::Knowledge(format!(
                "Model mismatch: index built with '{}', configured '{}'",
                self.model, other.model
            )));
        }

        if self.dimensions != other.dimensions {
            return Err(AppError::Knowledge(format!(
                "Dimension mismatch: index built with {}, configured {}",
                self.dimensions, other.dimensions
            )));
        }

        Ok(())
    }
}
