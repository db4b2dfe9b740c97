//! Embedding functions backing the vector index.
//!
//! A provider turns text into fixed-length vectors. The knowledge base records
//! which provider built an index so a later process embeds queries the same way.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
