//! The knowledge store: parse, chunk and index documents, then retrieve.

use crate::chunker::{chunk_text, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::config::{self as kb_config, KnowledgeBaseState};
use crate::embeddings::{create_provider, EmbeddingConfig};
use crate::parser::{decode_bytes, parse_document, ParsedDocument};
use crate::sqlite_index::SqliteCollection;
use crate::types::{BuildStats, Chunk, ChunkMetadata, Document, RetrievedChunk};
use crate::vector_index::{DistanceMetric, VectorIndex};
use chrono::Utc;
use qa_core::config::AppConfig;
use qa_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Id prefix of chunks taken from the page-under-test.
pub const PAGE_CHUNK_PREFIX: &str = "html";

/// The HTML page that generated scripts drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUnderTest {
    pub filename: String,

    /// Decoded markup as supplied
    pub markup: String,

    /// Visible text
    pub text: String,
    pub element_ids: Vec<String>,
    pub element_names: Vec<String>,
}

impl PageUnderTest {
    /// Build from a parsed document and the markup it was parsed from.
    pub fn from_parsed(parsed: &ParsedDocument, markup: String) -> Self {
        Self {
            filename: parsed.source_document.clone(),
            markup,
            text: parsed.text.clone(),
            element_ids: parsed.metadata.html_ids.clone(),
            element_names: parsed.metadata.html_names.clone(),
        }
    }

    /// Re-parse stored markup.
    pub fn from_markup(filename: &str, markup: &str) -> Self {
        let parsed = parse_document(filename, markup.as_bytes());
        Self::from_parsed(&parsed, markup.to_string())
    }
}

/// Indexed chunks plus the optional page-under-test.
pub struct KnowledgeBase {
    index: Arc<dyn VectorIndex>,
    chunk_size: usize,
    chunk_overlap: usize,
    page: Option<PageUnderTest>,
}

impl KnowledgeBase {
    /// Wrap an index with the default chunking (800 chars, 120 overlap).
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self {
            index,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            page: None,
        }
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }

    /// Open the persistent knowledge base described by `config`, restoring
    /// the page-under-test saved by an earlier build.
    pub fn open(config: &AppConfig) -> AppResult<Self> {
        let settings = &config.knowledge;
        let embedding = EmbeddingConfig::from_app_config(config);

        let state = kb_config::load_state(&config.workspace, &settings.collection)?;
        if let Some(state) = &state {
            state.embedding.validate_consistency(&embedding)?;
        }

        let embedder = create_provider(&embedding)?;
        let index = SqliteCollection::create_or_open(
            &config.index_dir(),
            &settings.collection,
            DistanceMetric::Cosine,
            embedder,
        )?;

        let mut kb = Self::new(Arc::new(index))
            .with_chunking(settings.chunk_size, settings.chunk_overlap);

        if let Some(state) = state {
            if let (Some(filename), Some(markup)) = (
                state.page_filename.as_deref(),
                kb_config::load_page_markup(&config.workspace, &settings.collection)?,
            ) {
                kb.restore_page(PageUnderTest::from_markup(filename, &markup));
            }
        }

        Ok(kb)
    }

    /// Parse, chunk and index `documents` and the optional page-under-test.
    ///
    /// Page chunks are `html-<n>`, document chunks `<filename>-<n>`. All chunks
    /// are written in one `add`, page first. A new page replaces the old one.
    /// Two inputs that would produce the same chunk id are rejected before
    /// anything is written.
    pub async fn build(
        &mut self,
        documents: &[Document],
        page: Option<&Document>,
    ) -> AppResult<BuildStats> {
        let start = Instant::now();
        info!(
            "Building knowledge base '{}' from {} documents{}",
            self.index.name(),
            documents.len(),
            if page.is_some() { " and a page under test" } else { "" }
        );

        let mut stats = BuildStats::default();
        let mut chunks = Vec::new();
        let mut new_page = None;

        if let Some(page_doc) = page {
            let parsed = parse_document(&page_doc.filename, &page_doc.content);
            if parsed.fidelity.is_degraded() {
                stats.degraded.push(parsed.source_document.clone());
            }
            chunks.extend(self.chunk_document(&parsed, PAGE_CHUNK_PREFIX));

            let (markup, _) = decode_bytes(&page_doc.content);
            new_page = Some(PageUnderTest::from_parsed(&parsed, markup));
            stats.page = Some(page_doc.filename.clone());
        }

        for doc in documents {
            let parsed = parse_document(&doc.filename, &doc.content);
            if parsed.fidelity.is_degraded() {
                stats.degraded.push(parsed.source_document.clone());
            }
            chunks.extend(self.chunk_document(&parsed, &doc.filename));
            stats.documents += 1;
        }

        check_unique_ids(&chunks)?;

        if !chunks.is_empty() {
            let ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let metadatas: Vec<ChunkMetadata> = chunks.into_iter().map(|c| c.metadata).collect();
            self.index.add(&ids, &texts, &metadatas).await?;
            stats.chunks = ids.len();
        }
        if new_page.is_some() {
            self.page = new_page;
        }

        stats.duration_secs = start.elapsed().as_secs_f64();
        info!(
            "Indexed {} chunks from {} documents in {:.2}s",
            stats.chunks, stats.documents, stats.duration_secs
        );

        Ok(stats)
    }

    fn chunk_document(&self, parsed: &ParsedDocument, id_prefix: &str) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = chunk_text(&parsed.text, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk {
                id: format!("{}-{}", id_prefix, i),
                text,
                metadata: ChunkMetadata {
                    source_document: parsed.source_document.clone(),
                    chunk_index: i,
                    html_ids: parsed.metadata.html_ids.clone(),
                    html_names: parsed.metadata.html_names.clone(),
                },
            })
            .collect();

        debug!(
            "{} ({}): {} chunks",
            parsed.source_document,
            parsed.kind.as_str(),
            chunks.len()
        );
        chunks
    }

    /// Up to `top_k` chunks most relevant to `query`, most relevant first.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> AppResult<Vec<RetrievedChunk>> {
        if query.trim().is_empty() {
            return Err(AppError::Input("Query must not be empty".to_string()));
        }
        let hits = self.index.query(query, top_k).await?;
        info!("Retrieved {} chunks for query", hits.len());
        Ok(hits)
    }

    /// Markup of the page-under-test, if one was supplied.
    pub fn get_html(&self) -> Option<&str> {
        self.page.as_ref().map(|p| p.markup.as_str())
    }

    /// Visible text of the page-under-test.
    pub fn page_text(&self) -> Option<&str> {
        self.page.as_ref().map(|p| p.text.as_str())
    }

    pub fn page(&self) -> Option<&PageUnderTest> {
        self.page.as_ref()
    }

    pub fn has_page(&self) -> bool {
        self.page.is_some()
    }

    /// Install a page-under-test without indexing it.
    pub fn restore_page(&mut self, page: PageUnderTest) {
        self.page = Some(page);
    }

    pub async fn chunk_count(&self) -> AppResult<usize> {
        self.index.count().await
    }

    /// Drop every chunk and forget the page-under-test.
    pub async fn reset(&mut self) -> AppResult<()> {
        self.index.reset().await?;
        self.page = None;
        Ok(())
    }

    /// Record this build so a later process can reopen the knowledge base.
    pub fn save_state(
        &self,
        config: &AppConfig,
        documents: &[Document],
        page_path: Option<&Path>,
    ) -> AppResult<()> {
        let collection = &config.knowledge.collection;
        let mut state = kb_config::load_state(&config.workspace, collection)?.unwrap_or_else(|| {
            KnowledgeBaseState::new(collection, EmbeddingConfig::from_app_config(config))
        });

        for doc in documents {
            if !state.documents.contains(&doc.filename) {
                state.documents.push(doc.filename.clone());
            }
        }
        if let Some(page) = &self.page {
            state.page_filename = Some(page.filename.clone());
            if let Some(path) = page_path {
                state.page_path = Some(absolute_path(path));
            }
        }
        state.last_built = Some(Utc::now());

        kb_config::save_state(
            &config.workspace,
            &state,
            self.page.as_ref().map(|p| p.markup.as_str()),
        )
    }
}

/// `path` resolved against the current directory, so it stays valid when a
/// later process runs elsewhere.
fn absolute_path(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn check_unique_ids(chunks: &[Chunk]) -> AppResult<()> {
    let mut seen: HashMap<&str, &str> = HashMap::with_capacity(chunks.len());
    for chunk in chunks {
        let source = chunk.metadata.source_document.as_str();
        if let Some(first) = seen.insert(chunk.id.as_str(), source) {
            return Err(AppError::Input(format!(
                "Duplicate chunk id '{}' from '{}' and '{}'; give the documents distinct names",
                chunk.id, first, source
            )));
        }
    }
    Ok(())
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("collection", &self.index.name())
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("page", &self.page.as_ref().map(|p| p.filename.as_str()))
            .finish()
    }
}
