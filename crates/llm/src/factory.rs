//! LLM provider factory.

use crate::client::LlmClient;
use crate::providers::{OfflineClient, OllamaClient};
use crate::types::ProviderType;
use qa_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Default base URL for the Ollama provider.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "offline")
/// * `endpoint` - Optional custom endpoint URL
/// * `timeout` - Bound on each generation request
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or the HTTP client
/// cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn LlmClient>> {
    match ProviderType::parse(provider) {
        Some(ProviderType::Ollama) => {
            let base_url = endpoint.unwrap_or(DEFAULT_OLLAMA_URL);
            let client = OllamaClient::new(base_url, timeout)?;
            Ok(Arc::new(client))
        }
        Some(ProviderType::Offline) => Ok(Arc::new(OfflineClient)),
        None => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, Duration::from_secs(60)).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client(
            "ollama",
            Some("http://localhost:8080"),
            Duration::from_secs(5),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_create_offline_client() {
        let client = create_client("offline", None, Duration::from_secs(1)).unwrap();
        assert_eq!(client.provider_name(), "offline");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, Duration::from_secs(1)) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
