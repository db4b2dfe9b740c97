//! Ollama LLM provider implementation.
//!
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md
//!
//! `/api/generate` streams newline-delimited JSON objects by default. Each
//! object may carry a `response` fragment; the fragments are concatenated in
//! arrival order. Lines that are not valid JSON are skipped.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use futures::StreamExt;
use qa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize, PartialEq)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// One line of the Ollama response stream.
#[derive(Debug, Default, Deserialize)]
struct OllamaFragment {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Accumulates newline-delimited fragments into one response.
#[derive(Debug, Default)]
struct FragmentCollector {
    pending: Vec<u8>,
    content: String,
    model: Option<String>,
    done: bool,
    usage: LlmUsage,
    skipped: usize,
}

impl FragmentCollector {
    /// Feed raw bytes; complete lines are decoded immediately.
    fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.accept_line(&line);
        }
    }

    /// Decode whatever is left after the stream ends.
    fn finish(mut self) -> Self {
        let rest = std::mem::take(&mut self.pending);
        self.accept_line(&rest);
        self
    }

    fn accept_line(&mut self, line: &[u8]) {
        let text = String::from_utf8_lossy(line);
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let fragment: OllamaFragment = match serde_json::from_str(text) {
            Ok(fragment) => fragment,
            Err(e) => {
                debug!("Skipping malformed fragment: {}", e);
                self.skipped += 1;
                return;
            }
        };

        if let Some(piece) = fragment.response {
            self.content.push_str(&piece);
        }
        if self.model.is_none() {
            self.model = fragment.model;
        }
        if fragment.done {
            self.done = true;
            self.usage = LlmUsage::new(
                fragment.prompt_eval_count.unwrap_or(0),
                fragment.eval_count.unwrap_or(0),
            );
        }
    }
}

/// Concatenate every `response` fragment of an NDJSON body.
pub fn collect_fragments(body: &str) -> String {
    let mut collector = FragmentCollector::default();
    collector.push(body.as_bytes());
    collector.finish().content
}

/// Ollama LLM client.
pub struct OllamaClient {
    /// Base URL for Ollama API
    base_url: String,

    /// HTTP client with the request timeout applied
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert LlmRequest to Ollama format.
    fn to_ollama_request(&self, request: &LlmRequest) -> OllamaRequest {
        let options = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            })
        } else {
            None
        };

        OllamaRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            options,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    #[instrument(skip(self, request), fields(model = %request.model, prompt_len = request.prompt.len()))]
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        info!("Sending generation request to Ollama");

        let ollama_request = self.to_ollama_request(request);
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let mut collector = FragmentCollector::default();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let bytes = chunk.map_err(|e| AppError::Llm(format!("Stream error: {}", e)))?;
            collector.push(&bytes);
        }
        let collector = collector.finish();

        if collector.skipped > 0 {
            warn!("Skipped {} malformed fragments from Ollama", collector.skipped);
        }

        if collector.content.is_empty() {
            return Err(AppError::Llm("Ollama returned no output".to_string()));
        }

        info!("Received {} characters from Ollama", collector.content.len());

        Ok(LlmResponse {
            content: collector.content,
            model: collector.model.unwrap_or_else(|| request.model.clone()),
            usage: collector.usage,
            done: collector.done,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_client_creation() {
        let client = OllamaClient::new("http://localhost:11434/", Duration::from_secs(60)).unwrap();
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_ollama_request_conversion() {
        let client = OllamaClient::new("http://localhost:11434", Duration::from_secs(60)).unwrap();
        let request = LlmRequest::new("Hello", "llama3").with_system("You are a QA agent.");

        let ollama_req = client.to_ollama_request(&request);
        assert_eq!(ollama_req.model, "llama3");
        assert_eq!(ollama_req.prompt, "Hello");
        assert_eq!(ollama_req.system.as_deref(), Some("You are a QA agent."));
        assert!(ollama_req.options.is_none());

        let json = serde_json::to_value(&ollama_req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"model": "llama3", "prompt": "Hello", "system": "You are a QA agent."})
        );
    }

    #[test]
    fn test_system_omitted_when_absent() {
        let client = OllamaClient::new("http://localhost:11434", Duration::from_secs(60)).unwrap();
        let json = serde_json::to_value(client.to_ollama_request(&LlmRequest::new("p", "m"))).unwrap();
        assert!(json.get("system").is_none());
    }

    #[test]
    fn test_collect_fragments_in_order() {
        let body = concat!(
            "{\"model\":\"llama3\",\"response\":\"| Test_ID \",\"done\":false}\n",
            "{\"model\":\"llama3\",\"response\":\"| Feature |\",\"done\":false}\n",
            "{\"model\":\"llama3\",\"response\":\"\",\"done\":true,\"eval_count\":7}\n",
        );
        assert_eq!(collect_fragments(body), "| Test_ID | Feature |");
    }

    #[test]
    fn test_collect_fragments_skips_malformed_lines() {
        let body = "{\"response\":\"a\"}\nnot json at all\n{\"response\":\"b\"}\n{\"status\":\"x\"}";
        assert_eq!(collect_fragments(body), "ab");
    }

    #[test]
    fn test_collector_handles_lines_split_across_chunks() {
        let mut collector = FragmentCollector::default();
        collector.push(b"{\"response\":\"hel");
        collector.push(b"lo\"}\n{\"response\":\" world\",\"done\":true,");
        collector.push(b"\"prompt_eval_count\":3,\"eval_count\":2}");
        let collector = collector.finish();

        assert_eq!(collector.content, "hello world");
        assert!(collector.done);
        assert_eq!(collector.usage, LlmUsage::new(3, 2));
        assert_eq!(collector.skipped, 0);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_error() {
        let client = OllamaClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = client.complete(&LlmRequest::new("hi", "llama3")).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }
}
