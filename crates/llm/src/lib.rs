//! Text-generation integration for the QA Agent.
//!
//! This crate wraps a remote text-generation endpoint behind the [`LlmClient`]
//! trait and layers the [`Generator`] on top of it, which never fails: when
//! the backend is unreachable it substitutes a deterministic canned response.
//!
//! # Providers
//! - **Ollama**: `POST <base_url>/api/generate`, newline-delimited JSON (default)
//! - **Offline**: always unavailable, forcing the canned fallback
//!
//! # Example
//! ```no_run
//! use qa_llm::{create_client, Generator};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("ollama", Some("http://localhost:11434"), Duration::from_secs(60))?;
//! let generator = Generator::new(client, "llama3");
//! let text = generator.generate("List checkout edge cases", None).await;
//! println!("{}", text);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod generator;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use generator::{
    is_fallback_output, is_script_request, Generator, FALLBACK_MARKER, FALLBACK_SCRIPT_NOTE,
    FALLBACK_TEST_CASES,
};
pub use providers::{OfflineClient, OllamaClient};
pub use types::ProviderType;
