//! SQLite-backed persistent collection.
//!
//! All collections share `<persist_dir>/index.sqlite`. Embeddings are stored
//! as little-endian `f32` blobs and searched by brute force.

use crate::embeddings::EmbeddingProvider;
use crate::types::{ChunkMetadata, RetrievedChunk};
use crate::vector_index::{
    check_parallel, rank, sanitize_collection_name, DistanceMetric, VectorIndex,
};
use chrono::Utc;
use qa_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// File name of the index database inside the persist directory.
pub const INDEX_FILE: &str = "index.sqlite";

/// A named collection inside the shared SQLite index.
pub struct SqliteCollection {
    conn: Mutex<Connection>,
    path: PathBuf,
    name: String,
    metric: DistanceMetric,
    embedder: Arc<dyn EmbeddingProvider>,
}

fn db_err(context: &str) -> impl Fn(rusqlite::Error) -> AppError + '_ {
    move |e| AppError::Knowledge(format!("{}: {}", context, e))
}

fn init_schema(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            metric TEXT NOT NULL,
            embedding_provider TEXT NOT NULL,
            embedding_model TEXT NOT NULL,
            dimensions INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chunks (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL,
            metadata TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (collection, id),
            FOREIGN KEY (collection) REFERENCES collections(name)
        );
        "#,
    )
    .map_err(db_err("Failed to create tables"))
}

impl SqliteCollection {
    /// Open the collection `name` under `persist_dir`, creating it if needed.
    ///
    /// An existing collection keeps the metric it was created with and must
    /// have been built with the same embedding provider, model and dimensions.
    pub fn create_or_open(
        persist_dir: &Path,
        name: &str,
        metric: DistanceMetric,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        std::fs::create_dir_all(persist_dir).map_err(|e| {
            AppError::Knowledge(format!("Failed to create index directory: {}", e))
        })?;

        let path = persist_dir.join(INDEX_FILE);
        let conn = Connection::open(&path).map_err(db_err("Failed to open SQLite index"))?;
        init_schema(&conn)?;

        let name = sanitize_collection_name(name);
        let existing: Option<(String, String, String, i64)> = conn
            .query_row(
                "SELECT metric, embedding_provider, embedding_model, dimensions
                 FROM collections WHERE name = ?1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()
            .map_err(db_err("Failed to read collection"))?;

        let metric = match existing {
            Some((stored_metric, provider, model, dims)) => {
                if provider != embedder.provider_name()
                    || model != embedder.model_name()
                    || dims as usize != embedder.dimensions()
                {
                    return Err(AppError::Knowledge(format!(
                        "Collection '{}' was built with {}/{} ({} dims); reset it before using {}/{} ({} dims)",
                        name,
                        provider,
                        model,
                        dims,
                        embedder.provider_name(),
                        embedder.model_name(),
                        embedder.dimensions()
                    )));
                }
                let stored = DistanceMetric::parse(&stored_metric)?;
                if stored != metric {
                    warn!(
                        "Collection '{}' uses {} distance, ignoring requested {}",
                        name,
                        stored.as_str(),
                        metric.as_str()
                    );
                }
                debug!("Opened collection '{}' at {:?}", name, path);
                stored
            }
            None => {
                conn.execute(
                    "INSERT INTO collections
                     (name, metric, embedding_provider, embedding_model, dimensions, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        name,
                        metric.as_str(),
                        embedder.provider_name(),
                        embedder.model_name(),
                        embedder.dimensions() as i64,
                        Utc::now().to_rfc3339(),
                    ],
                )
                .map_err(db_err("Failed to create collection"))?;
                info!("Created collection '{}' at {:?}", name, path);
                metric
            }
        };

        Ok(Self {
            conn: Mutex::new(conn),
            path,
            name,
            metric,
            embedder,
        })
    }

    /// Delete collection `name` and its chunks without opening it, so a
    /// collection built with a different embedder can still be discarded.
    /// Returns the number of chunks removed.
    pub fn drop_collection(persist_dir: &Path, name: &str) -> AppResult<usize> {
        let path = persist_dir.join(INDEX_FILE);
        if !path.exists() {
            return Ok(0);
        }

        let mut conn = Connection::open(&path).map_err(db_err("Failed to open SQLite index"))?;
        init_schema(&conn)?;

        let name = sanitize_collection_name(name);
        let tx = conn
            .transaction()
            .map_err(db_err("Failed to begin transaction"))?;
        let removed = tx
            .execute("DELETE FROM chunks WHERE collection = ?1", params![name])
            .map_err(db_err("Failed to delete chunks"))?;
        tx.execute("DELETE FROM collections WHERE name = ?1", params![name])
            .map_err(db_err("Failed to delete collection"))?;
        tx.commit().map_err(db_err("Failed to commit"))?;

        info!("Dropped collection '{}' ({} chunks)", name, removed);
        Ok(removed)
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Knowledge("SQLite connection lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl VectorIndex for SqliteCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }

    async fn add(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[ChunkMetadata],
    ) -> AppResult<()> {
        check_parallel(ids, documents, metadatas)?;
        if ids.is_empty() {
            return Ok(());
        }

        let embeddings = self.embedder.embed_batch(documents).await?;
        let now = Utc::now().to_rfc3339();

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(db_err("Failed to begin transaction"))?;
        {
            // Upsert keeps the original rowid, so insertion order survives.
            let mut stmt = tx
                .prepare(
                    "INSERT INTO chunks (collection, id, text, embedding, metadata, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(collection, id) DO UPDATE SET
                        text = excluded.text,
                        embedding = excluded.embedding,
                        metadata = excluded.metadata,
                        updated_at = excluded.updated_at",
                )
                .map_err(db_err("Failed to prepare insert"))?;

            for (((id, text), metadata), embedding) in
                ids.iter().zip(documents).zip(metadatas).zip(&embeddings)
            {
                let metadata_json = serde_json::to_string(metadata)?;
                stmt.execute(params![
                    self.name,
                    id,
                    text,
                    embedding_to_bytes(embedding),
                    metadata_json,
                    now,
                ])
                .map_err(db_err("Failed to insert chunk"))?;
            }
        }
        tx.commit().map_err(db_err("Failed to commit chunks"))?;

        debug!("Added {} chunks to collection '{}'", ids.len(), self.name);
        Ok(())
    }

    async fn query(&self, text: &str, top_k: usize) -> AppResult<Vec<RetrievedChunk>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(text).await?;

        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, text, embedding, metadata FROM chunks
                 WHERE collection = ?1 ORDER BY rowid",
            )
            .map_err(db_err("Failed to prepare query"))?;

        let rows = stmt
            .query_map(params![self.name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(db_err("Failed to query chunks"))?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, text, blob, metadata_json) = row.map_err(db_err("Failed to read chunk"))?;
            let embedding = bytes_to_embedding(&blob)?;
            let metadata: ChunkMetadata = serde_json::from_str(&metadata_json)?;
            hits.push(RetrievedChunk {
                distance: self.metric.distance(&query_embedding, &embedding),
                id,
                text,
                metadata,
            });
        }

        let ranked = rank(hits, top_k);
        debug!(
            "Retrieved {} chunks from '{}' (requested top-{})",
            ranked.len(),
            self.name,
            top_k
        );
        Ok(ranked)
    }

    async fn count(&self) -> AppResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
                params![self.name],
                |row| row.get(0),
            )
            .map_err(db_err("Failed to count chunks"))?;
        Ok(count as usize)
    }

    async fn reset(&self) -> AppResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM chunks WHERE collection = ?1", params![self.name])
            .map_err(db_err("Failed to delete chunks"))?;
        info!("Reset collection '{}'", self.name);
        Ok(())
    }
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
