//! Generation client with deterministic offline fallback.
//!
//! `Generator::generate` always returns text. Backend failures (network
//! errors, non-success status, empty output) are logged and replaced with a
//! canned response chosen by the system instruction.

use crate::client::{LlmClient, LlmRequest};
use qa_core::AppResult;
use std::sync::Arc;
use tracing::{info, warn};

/// Prefix every canned script response starts with.
pub const FALLBACK_MARKER: &str = "# Fallback";

/// Canned response for script-generation requests.
pub const FALLBACK_SCRIPT_NOTE: &str = "# Fallback generator: ensure IDs in the page under test are used. \
# The final script should open the local checkout page, fill form, apply coupon, and assert payment success.";

/// Canned response for test-case requests.
pub const FALLBACK_TEST_CASES: &str = "| Test_ID | Feature | Test_Scenario | Expected_Result | Grounded_In |\n\
|---------|---------|---------------|-----------------|-------------|\n\
| TC-001 | Discount Code | Apply valid code SAVE15 | Total reduced by 15% | product_specs.md |\n\
| TC-002 | Discount Code | Apply invalid code ABC | Error message shown | product_specs.md |\n";

/// Keyword identifying a browser-automation system instruction.
const SCRIPT_KEYWORD: &str = "Selenium";

/// Whether `system` asks for browser-automation code.
pub fn is_script_request(system: Option<&str>) -> bool {
    system.is_some_and(|s| s.contains(SCRIPT_KEYWORD))
}

/// Whether `text` is the generator's canned script response.
pub fn is_fallback_output(text: &str) -> bool {
    text.trim_start().starts_with(FALLBACK_MARKER)
}

/// Text-generation client that substitutes a canned answer on failure.
#[derive(Clone)]
pub struct Generator {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl Generator {
    /// Create a generator sending requests for `model` through `client`.
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Sampling settings sent with every request; `None` leaves the
    /// backend default.
    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Model name sent with each request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Name of the underlying provider.
    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    /// Generate text for `prompt`, falling back to a canned response.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> String {
        match self.try_generate(prompt, system).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "Generation backend '{}' unavailable, using fallback: {}",
                    self.client.provider_name(),
                    e
                );
                Self::fallback(system).to_string()
            }
        }
    }

    /// Call the backend without fallback.
    pub async fn try_generate(&self, prompt: &str, system: Option<&str>) -> AppResult<String> {
        let mut request = LlmRequest::new(prompt, self.model.as_str());
        if let Some(system) = system {
            request = request.with_system(system);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self.client.complete(&request).await?;
        info!(
            "Generated {} characters with model '{}'",
            response.content.len(),
            response.model
        );
        Ok(response.content)
    }

    /// Deterministic response used when the backend fails.
    pub fn fallback(system: Option<&str>) -> &'static str {
        if is_script_request(system) {
            FALLBACK_SCRIPT_NOTE
        } else {
            FALLBACK_TEST_CASES
        }
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("provider", &self.client.provider_name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}
