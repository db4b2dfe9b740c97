//! Configuration management for the QA Agent.
//!
//! Configuration is merged from several sources, later sources winning:
//! - Built-in defaults
//! - Config file (`.qa/config.yaml` in the workspace, or `QA_CONFIG`)
//! - Environment variables (`OLLAMA_URL`, `OLLAMA_MODEL`, ...)
//! - Command-line flags
//!
//! The configuration is workspace-centric, with all state stored in `.qa/`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default generation backend base URL.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default generation model.
pub const DEFAULT_MODEL: &str = "llama3";

/// Default generation request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default vector collection name.
pub const DEFAULT_COLLECTION: &str = "knowledgebase";

/// Generation providers the CLI knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "offline"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .qa/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Text-generation backend settings
    pub generation: GenerationSettings,

    /// Knowledge store settings
    pub knowledge: KnowledgeSettings,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Settings for the remote text-generation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Provider identifier ("ollama" or "offline")
    pub provider: String,

    /// Base URL of the generation backend
    pub endpoint: String,

    /// Model name sent with every request
    pub model: String,

    /// Request timeout in seconds
    #[serde(rename = "timeoutSecs")]
    pub timeout_secs: u64,

    /// Sampling temperature; the backend default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Cap on generated tokens; unbounded when unset
    #[serde(rename = "maxTokens", default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Settings for ingestion, indexing and retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSettings {
    /// Vector collection name (sanitised before use)
    pub collection: String,

    /// Directory holding the index database (default: `.qa/index`)
    #[serde(rename = "persistDir", skip_serializing_if = "Option::is_none")]
    pub persist_dir: Option<PathBuf>,

    /// Chunk window size in characters
    #[serde(rename = "chunkSize")]
    pub chunk_size: usize,

    /// Characters shared by consecutive windows
    #[serde(rename = "chunkOverlap")]
    pub chunk_overlap: usize,

    /// Chunks retrieved for test-case generation
    #[serde(rename = "topK")]
    pub top_k: usize,

    /// Embedding provider ("trigram" or "ollama")
    #[serde(rename = "embeddingProvider")]
    pub embedding_provider: String,

    /// Embedding model identifier
    #[serde(rename = "embeddingModel")]
    pub embedding_model: String,

    /// Embedding vector dimension
    #[serde(rename = "embeddingDim")]
    pub embedding_dim: usize,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            persist_dir: None,
            chunk_size: 800,
            chunk_overlap: 120,
            top_k: 8,
            embedding_provider: "trigram".to_string(),
            embedding_model: "trigram-v1".to_string(),
            embedding_dim: 384,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    generation: Option<GenerationFileSection>,
    knowledge: Option<KnowledgeFileSection>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GenerationFileSection {
    provider: Option<String>,
    endpoint: Option<String>,
    model: Option<String>,
    #[serde(rename = "timeoutSecs")]
    timeout_secs: Option<u64>,
    temperature: Option<f32>,
    #[serde(rename = "maxTokens")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct KnowledgeFileSection {
    collection: Option<String>,
    #[serde(rename = "persistDir")]
    persist_dir: Option<PathBuf>,
    #[serde(rename = "chunkSize")]
    chunk_size: Option<usize>,
    #[serde(rename = "chunkOverlap")]
    chunk_overlap: Option<usize>,
    #[serde(rename = "topK")]
    top_k: Option<usize>,
    #[serde(rename = "embeddingProvider")]
    embedding_provider: Option<String>,
    #[serde(rename = "embeddingModel")]
    embedding_model: Option<String>,
    #[serde(rename = "embeddingDim")]
    embedding_dim: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            generation: GenerationSettings::default(),
            knowledge: KnowledgeSettings::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `QA_WORKSPACE`: Override workspace path
    /// - `QA_CONFIG`: Path to config file
    /// - `OLLAMA_URL`: Generation backend base URL
    /// - `OLLAMA_MODEL`: Generation model name
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use qa_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` in place of the process environment.
    pub fn load_with<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(workspace) = lookup("QA_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Some(config_file) = lookup("QA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.qa_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        Ok(config.apply_env(lookup))
    }

    /// Apply environment overrides through `lookup`.
    fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("OLLAMA_URL") {
            self.generation.endpoint = endpoint;
        }

        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.generation.model = model;
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }

        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }

        self
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(generation) = config_file.generation {
            if let Some(provider) = generation.provider {
                result.generation.provider = provider;
            }
            if let Some(endpoint) = generation.endpoint {
                result.generation.endpoint = endpoint;
            }
            if let Some(model) = generation.model {
                result.generation.model = model;
            }
            if let Some(timeout) = generation.timeout_secs {
                result.generation.timeout_secs = timeout;
            }
            if let Some(temperature) = generation.temperature {
                result.generation.temperature = Some(temperature);
            }
            if let Some(max_tokens) = generation.max_tokens {
                result.generation.max_tokens = Some(max_tokens);
            }
        }

        if let Some(knowledge) = config_file.knowledge {
            let target = &mut result.knowledge;
            if let Some(collection) = knowledge.collection {
                target.collection = collection;
            }
            if let Some(dir) = knowledge.persist_dir {
                target.persist_dir = Some(dir);
            }
            if let Some(size) = knowledge.chunk_size {
                target.chunk_size = size;
            }
            if let Some(overlap) = knowledge.chunk_overlap {
                target.chunk_overlap = overlap;
            }
            if let Some(top_k) = knowledge.top_k {
                target.top_k = top_k;
            }
            if let Some(provider) = knowledge.embedding_provider {
                target.embedding_provider = provider;
            }
            if let Some(model) = knowledge.embedding_model {
                target.embedding_model = model;
            }
            if let Some(dim) = knowledge.embedding_dim {
                target.embedding_dim = dim;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and the
    /// config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        endpoint: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        offline: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(endpoint) = endpoint {
            self.generation.endpoint = endpoint;
        }

        if let Some(model) = model {
            self.generation.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if offline {
            self.generation.provider = "offline".to_string();
        }

        self
    }

    /// Get the path to the .qa directory.
    pub fn qa_dir(&self) -> PathBuf {
        self.workspace.join(".qa")
    }

    /// Ensure the .qa directory exists.
    pub fn ensure_qa_dir(&self) -> AppResult<()> {
        let qa_dir = self.qa_dir();
        if !qa_dir.exists() {
            std::fs::create_dir_all(&qa_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .qa directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Directory holding the persistent vector index.
    pub fn index_dir(&self) -> PathBuf {
        match &self.knowledge.persist_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.workspace.join(dir),
            None => self.qa_dir().join("index"),
        }
    }

    /// Validate the merged configuration.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.generation.provider.as_str();
        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.generation.timeout_secs == 0 {
            return Err(AppError::Config(
                "Generation timeout must be at least one second".to_string(),
            ));
        }

        if let Some(t) = self.generation.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(AppError::Config(format!(
                    "Temperature must be between 0 and 2, got {}",
                    t
                )));
            }
        }

        if self.generation.max_tokens == Some(0) {
            return Err(AppError::Config("maxTokens must be positive".to_string()));
        }

        let knowledge = &self.knowledge;
        if knowledge.chunk_size == 0 {
            return Err(AppError::Config("Chunk size must be positive".to_string()));
        }

        if knowledge.chunk_overlap >= knowledge.chunk_size {
            return Err(AppError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                knowledge.chunk_overlap, knowledge.chunk_size
            )));
        }

        if knowledge.top_k == 0 {
            return Err(AppError::Config("topK must be positive".to_string()));
        }

        Ok(())
    }
}
