//! Concrete text-generation providers.

pub mod offline;
pub mod ollama;

pub use offline::OfflineClient;
pub use ollama::OllamaClient;
