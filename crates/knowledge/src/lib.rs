//! Knowledge store for QA generation.
//!
//! Documents are parsed into text, cut into overlapping windows and written
//! to a vector collection. Queries return the nearest windows with their
//! source metadata. An optional HTML page-under-test is indexed like any
//! other document and also kept whole for script generation.

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod html;
pub mod knowledge_base;
pub mod memory_index;
pub mod parser;
pub mod source;
pub mod sqlite_index;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use chunker::{chunk_text, chunk_windows, ChunkWindow};
pub use config::KnowledgeBaseState;
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use knowledge_base::{KnowledgeBase, PageUnderTest};
pub use memory_index::InMemoryCollection;
pub use parser::{
    parse_document, DegradeReason, DocumentKind, DocumentMetadata, ParseFidelity, ParsedDocument,
};
pub use source::load_documents;
pub use sqlite_index::SqliteCollection;
pub use types::{BuildStats, Chunk, ChunkMetadata, Document, RetrievedChunk};
pub use vector_index::{sanitize_collection_name, DistanceMetric, VectorIndex};
