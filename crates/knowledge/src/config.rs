//! Knowledge base state persisted between processes.
//!
//! Layout under the workspace:
//!
//! ```text
//! .qa/knowledge/<collection>/state.yaml   KnowledgeBaseState
//! .qa/knowledge/<collection>/page.html    page-under-test markup
//! ```

use crate::embeddings::EmbeddingConfig;
use crate::vector_index::sanitize_collection_name;
use chrono::{DateTime, Utc};
use qa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const STATE_FILE: &str = "state.yaml";
const PAGE_FILE: &str = "page.html";

/// What a later process needs to reuse a built knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseState {
    /// Sanitised collection name
    pub collection: String,

    /// Embedding function the index was built with
    pub embedding: EmbeddingConfig,

    /// Filename of the page-under-test, if one was supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_filename: Option<String>,

    /// Where the page-under-test was read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_path: Option<PathBuf>,

    /// Regular documents ingested so far
    #[serde(default)]
    pub documents: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_built: Option<DateTime<Utc>>,
}

impl KnowledgeBaseState {
    pub fn new(collection: &str, embedding: EmbeddingConfig) -> Self {
        Self {
            collection: sanitize_collection_name(collection),
            embedding,
            page_filename: None,
            page_path: None,
            documents: Vec::new(),
            last_built: None,
        }
    }
}

/// Directory holding a collection's state.
pub fn get_state_dir(workspace: &Path, collection: &str) -> PathBuf {
    workspace
        .join(".qa")
        .join("knowledge")
        .join(sanitize_collection_name(collection))
}

pub fn get_state_path(workspace: &Path, collection: &str) -> PathBuf {
    get_state_dir(workspace, collection).join(STATE_FILE)
}

pub fn get_page_path(workspace: &Path, collection: &str) -> PathBuf {
    get_state_dir(workspace, collection).join(PAGE_FILE)
}

/// Load state, or `None` when the knowledge base was never built.
pub fn load_state(workspace: &Path, collection: &str) -> AppResult<Option<KnowledgeBaseState>> {
    let path = get_state_path(workspace, collection);
    if !path.exists() {
        tracing::debug!("No knowledge base state at {:?}", path);
        return Ok(None);
    }

    let content = fs::read_to_string(&path).map_err(|e| {
        AppError::Knowledge(format!("Failed to read state at {:?}: {}", path, e))
    })?;
    let state = serde_yaml::from_str(&content).map_err(|e| {
        AppError::Knowledge(format!("Failed to parse state at {:?}: {}", path, e))
    })?;
    Ok(Some(state))
}

/// Save state and, when given, the page-under-test markup.
pub fn save_state(
    workspace: &Path,
    state: &KnowledgeBaseState,
    page_markup: Option<&str>,
) -> AppResult<()> {
    let dir = get_state_dir(workspace, &state.collection);
    fs::create_dir_all(&dir).map_err(|e| {
        AppError::Knowledge(format!("Failed to create state directory: {}", e))
    })?;

    let yaml = serde_yaml::to_string(state)?;
    fs::write(dir.join(STATE_FILE), yaml)
        .map_err(|e| AppError::Knowledge(format!("Failed to write state: {}", e)))?;

    if let Some(markup) = page_markup {
        fs::write(dir.join(PAGE_FILE), markup)
            .map_err(|e| AppError::Knowledge(format!("Failed to write page markup: {}", e)))?;
    }

    tracing::debug!("Saved knowledge base state for '{}'", state.collection);
    Ok(())
}

/// Stored page-under-test markup, if any.
pub fn load_page_markup(workspace: &Path, collection: &str) -> AppResult<Option<String>> {
    let path = get_page_path(workspace, collection);
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(&path)
        .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;
    Ok(Some(crate::parser::decode_bytes(&bytes).0))
}

/// Remove a collection's state directory.
pub fn clear_state(workspace: &Path, collection: &str) -> AppResult<()> {
    let dir = get_state_dir(workspace, collection);
    if dir.exists() {
        fs::remove_dir_all(&dir).map_err(|e| {
            AppError::Knowledge(format!("Failed to remove {:?}: {}", dir, e))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_state_is_none() {
        let temp = TempDir::new().unwrap();
        assert!(load_state(temp.path(), "knowledgebase").unwrap().is_none());
        assert!(load_page_markup(temp.path(), "knowledgebase").unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_state() {
        let temp = TempDir::new().unwrap();
        let mut state = KnowledgeBaseState::new("Knowledge Base", EmbeddingConfig::default());
        state.page_filename = Some("checkout.html".to_string());
        state.documents = vec!["product_specs.md".to_string()];
        state.last_built = Some(Utc::now());

        save_state(temp.path(), &state, Some("<input id=\"email\">")).unwrap();

        let loaded = load_state(temp.path(), "knowledgebase").unwrap().unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.collection, "knowledgebase");
        assert_eq!(
            load_page_markup(temp.path(), "knowledgebase").unwrap().as_deref(),
            Some("<input id=\"email\">")
        );
        assert!(get_state_path(temp.path(), "knowledgebase")
            .ends_with(".qa/knowledge/knowledgebase/state.yaml"));
    }

    #[test]
    fn test_clear_state() {
        let temp = TempDir::new().unwrap();
        let state = KnowledgeBaseState::new("kb", EmbeddingConfig::default());
        save_state(temp.path(), &state, None).unwrap();

        clear_state(temp.path(), "kb").unwrap();
        assert!(load_state(temp.path(), "kb").unwrap().is_none());
        clear_state(temp.path(), "kb").unwrap();
    }
}
