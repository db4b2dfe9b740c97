//! Knowledge system type definitions.

use qa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A named document as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// File name; its extension selects the parser
    pub filename: String,

    /// Raw bytes
    pub content: Vec<u8>,
}

impl Document {
    /// Create a document from a name and raw bytes.
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Read a document from disk, naming it after the file.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| AppError::Input(format!("Not a file path: {:?}", path)))?;

        Self::read_as(path, filename)
    }

    /// Read a document from disk under an explicit name.
    pub fn read_as(path: &Path, filename: impl Into<String>) -> AppResult<Self> {
        let content = std::fs::read(path)
            .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;

        Ok(Self {
            filename: filename.into(),
            content,
        })
    }
}

/// Metadata stored with every indexed chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Name of the document the chunk came from
    pub source_document: String,

    /// Ordinal of the chunk within its document
    pub chunk_index: usize,

    /// Element ids found in the source markup
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub html_ids: Vec<String>,

    /// Element names found in the source markup
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub html_names: Vec<String>,
}

/// A text window ready to be written to the vector index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Identifier, unique within a knowledge base
    pub id: String,

    /// Window text
    pub text: String,

    /// Source, ordinal and structural metadata
    pub metadata: ChunkMetadata,
}

/// A chunk returned by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Identifier the chunk was indexed under
    pub id: String,

    /// Chunk text
    pub text: String,

    /// Metadata written with the chunk
    pub metadata: ChunkMetadata,

    /// Distance to the query under the collection's metric (lower is closer)
    pub distance: f32,
}

/// Statistics from a build operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildStats {
    /// Regular documents ingested
    pub documents: usize,

    /// Chunks written to the index
    pub chunks: usize,

    /// Page-under-test filename, when one was supplied
    pub page: Option<String>,

    /// Documents whose text was recovered with reduced fidelity
    pub degraded: Vec<String>,

    /// Duration in seconds
    pub duration_secs: f64,
}
