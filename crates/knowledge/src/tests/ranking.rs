use crate::embeddings::EmbeddingProvider;
use crate::sqlite_index::SqliteCollection;
use crate::types::ChunkMetadata;
use crate::vector_index::{DistanceMetric, VectorIndex};
use qa_core::AppResult;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

/// Embedder returning a fixed vector per known text, zeros otherwise.
#[derive(Debug)]
struct FixedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
}

impl FixedEmbedder {
    fn new(pairs: &[(&str, [f32; 3])]) -> Self {
        Self {
            vectors: pairs
                .iter()
                .map(|(text, v)| (text.to_string(), v.to_vec()))
                .collect(),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FixedEmbedder {
    fn provider_name(&self) -> &str {
        "fixed"
    }

    fn model_name(&self) -> &str {
        "fixed-v1"
    }

    fn dimensions(&self) -> usize {
        3
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| self.vectors.get(t).cloned().unwrap_or_else(|| vec![0.0; 3]))
            .collect())
    }
}

const VECTORS: &[(&str, [f32; 3])] = &[
    ("discount code", [1.0, 0.0, 0.0]),
    ("SAVE15 gives 15% off", [0.9, 0.1, 0.0]),
    ("Coupons stack with shipping", [0.6, 0.6, 0.0]),
    ("Express shipping is $10", [0.0, 1.0, 0.0]),
    ("Opposite of discounts", [-1.0, 0.0, 0.0]),
    ("Pay Now button", [0.0, 0.0, 1.0]),
];

fn collection(dir: &TempDir, metric: DistanceMetric) -> SqliteCollection {
    SqliteCollection::create_or_open(
        dir.path(),
        "ranking",
        metric,
        Arc::new(FixedEmbedder::new(VECTORS)),
    )
    .unwrap()
}

async fn add_all(collection: &SqliteCollection, texts: &[&str]) {
    let ids: Vec<String> = (0..texts.len()).map(|i| format!("doc.md-{}", i)).collect();
    let docs: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
    let metas: Vec<ChunkMetadata> = (0..texts.len())
        .map(|i| ChunkMetadata {
            source_document: "doc.md".to_string(),
            chunk_index: i,
            ..Default::default()
        })
        .collect();
    collection.add(&ids, &docs, &metas).await.unwrap();
}

#[tokio::test]
async fn test_most_similar_chunk_ranks_first() {
    let temp = TempDir::new().unwrap();
    let kb = collection(&temp, DistanceMetric::Cosine);
    add_all(
        &kb,
        &["Express shipping is $10", "SAVE15 gives 15% off", "Pay Now button"],
    )
    .await;

    let results = kb.query("discount code", 3).await.unwrap();
    assert_eq!(results[0].text, "SAVE15 gives 15% off");
    assert!(results[0].distance < 0.01);
}

#[tokio::test]
async fn test_distances_are_non_decreasing() {
    let temp = TempDir::new().unwrap();
    let kb = collection(&temp, DistanceMetric::Cosine);
    add_all(
        &kb,
        &[
            "Opposite of discounts",
            "Express shipping is $10",
            "Coupons stack with shipping",
            "SAVE15 gives 15% off",
        ],
    )
    .await;

    let results = kb.query("discount code", 10).await.unwrap();
    let order: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(
        order,
        vec![
            "SAVE15 gives 15% off",
            "Coupons stack with shipping",
            "Express shipping is $10",
            "Opposite of discounts",
        ]
    );
    assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
    assert!((results[3].distance - 2.0).abs() < 1e-4);
}

#[tokio::test]
async fn test_l2_ranking() {
    let temp = TempDir::new().unwrap();
    let kb = collection(&temp, DistanceMetric::L2);
    add_all(&kb, &["Pay Now button", "SAVE15 gives 15% off"]).await;

    let results = kb.query("discount code", 2).await.unwrap();
    assert_eq!(results[0].text, "SAVE15 gives 15% off");
    assert!((results[1].distance - 2f32.sqrt()).abs() < 1e-4);
}

#[tokio::test]
async fn test_empty_collection_returns_nothing() {
    let temp = TempDir::new().unwrap();
    let kb = collection(&temp, DistanceMetric::Cosine);
    assert!(kb.query("discount code", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_top_k_limit_respected() {
    let temp = TempDir::new().unwrap();
    let kb = collection(&temp, DistanceMetric::Cosine);
    add_all(
        &kb,
        &[
            "Express shipping is $10",
            "SAVE15 gives 15% off",
            "Pay Now button",
            "Coupons stack with shipping",
        ],
    )
    .await;

    assert_eq!(kb.query("discount code", 2).await.unwrap().len(), 2);
}
