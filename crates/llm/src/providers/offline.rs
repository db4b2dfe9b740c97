//! Provider that never reaches a backend.
//!
//! Selected with `--offline`; every call fails so the `Generator` answers
//! with its canned fallback.

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use qa_core::{AppError, AppResult};

/// Always-unavailable LLM client.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineClient;

#[async_trait::async_trait]
impl LlmClient for OfflineClient {
    fn provider_name(&self) -> &str {
        "offline"
    }

    async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
        Err(AppError::Llm("generation backend disabled (offline mode)".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_always_fails() {
        let result = OfflineClient.complete(&LlmRequest::new("hi", "llama3")).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }
}
