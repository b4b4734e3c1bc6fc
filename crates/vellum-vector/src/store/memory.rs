//! Embedded in-memory similarity index.
//!
//! The local backend: records keyed by their explicit payload id, deletion
//! by metadata-to-id lookup, exhaustive cosine-similarity search. Also the
//! store the rebuild and retriever tests run against.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use vellum_core::{Error, Result};

use crate::store::VectorStore;
use crate::types::{BACKEND_LOCAL, EmbeddedRecord, MetadataFilter, SearchHit};

/// In-memory vector store keyed by explicit record ids.
#[derive(Default)]
pub struct MemoryVectorStore {
    entries: RwLock<HashMap<String, EmbeddedRecord>>,
}

impl MemoryVectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn add(&self, records: Vec<EmbeddedRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut entries = self.entries.write().await;
        for record in records {
            if record.record.id.trim().is_empty() {
                return Err(Error::invalid_data(
                    "local-index records require an explicit id",
                ));
            }
            // Same id overwrites: repeated rebuilds replace, never duplicate.
            entries.insert(record.record.id.clone(), record);
        }
        Ok(())
    }

    async fn delete_where(&self, filter: &MetadataFilter) -> Result<()> {
        if filter.is_empty() {
            return Err(Error::invalid_data("refusing delete with empty filter"));
        }

        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| !filter.matches(&entry.record.metadata));
        Ok(())
    }

    async fn similarity_search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let entries = self.entries.read().await;

        let mut hits: Vec<SearchHit> = entries
            .values()
            .map(|entry| SearchHit {
                record: entry.record.clone(),
                score: cosine_similarity(vector, &entry.vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        Ok(hits)
    }

    fn supplies_ids(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        BACKEND_LOCAL
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }
}

/// Cosine similarity of two vectors; zero when either has zero norm
/// or the dimensions disagree.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IndexRecord, RecordMetadata};

    fn entry(id: &str, user: &str, doc: &str, vector: Vec<f32>) -> EmbeddedRecord {
        let metadata = RecordMetadata {
            user_id: user.to_string(),
            document_id: doc.to_string(),
            link_id: None,
            variant: "default".to_string(),
            title: None,
        };
        EmbeddedRecord::new(IndexRecord::new(id, format!("text for {doc}"), metadata), vector)
    }

    #[tokio::test]
    async fn test_add_and_count() {
        let store = MemoryVectorStore::new();
        assert_eq!(store.count().await.unwrap(), 0);

        store
            .add(vec![
                entry("r1", "user-1", "doc-1", vec![1.0, 0.0]),
                entry("r2", "user-1", "doc-2", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_add_empty_is_noop() {
        let store = MemoryVectorStore::new();
        store.add(vec![]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_same_id_overwrites() {
        let store = MemoryVectorStore::new();
        store
            .add(vec![entry("r1", "user-1", "doc-1", vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .add(vec![entry("r1", "user-1", "doc-1", vec![0.0, 1.0])])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_add_requires_id() {
        let store = MemoryVectorStore::new();
        let result = store
            .add(vec![entry("", "user-1", "doc-1", vec![1.0])])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_where_scopes_correctly() {
        let store = MemoryVectorStore::new();
        store
            .add(vec![
                entry("a1", "user-a", "doc-1", vec![1.0, 0.0]),
                entry("a2", "user-a", "doc-2", vec![0.0, 1.0]),
                entry("b1", "user-b", "doc-3", vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        store
            .delete_where(&MetadataFilter::user("user-a"))
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let hits = store.similarity_search(&[1.0, 1.0], 10).await.unwrap();
        assert_eq!(hits[0].record.metadata.user_id, "user-b");
    }

    #[tokio::test]
    async fn test_delete_where_zero_matches_is_noop() {
        let store = MemoryVectorStore::new();
        store
            .add(vec![entry("a1", "user-a", "doc-1", vec![1.0])])
            .await
            .unwrap();

        store
            .delete_where(&MetadataFilter::user("user-z"))
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_where_rejects_empty_filter() {
        let store = MemoryVectorStore::new();
        assert!(store.delete_where(&MetadataFilter::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let store = MemoryVectorStore::new();
        store
            .add(vec![
                entry("r1", "user-1", "doc-a", vec![1.0, 0.0]),
                entry("r2", "user-1", "doc-b", vec![0.0, 1.0]),
                entry("r3", "user-1", "doc-c", vec![0.7, 0.7]),
            ])
            .await
            .unwrap();

        let hits = store.similarity_search(&[0.0, 1.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].record.metadata.document_id, "doc-b");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_search_k_larger_than_store() {
        let store = MemoryVectorStore::new();
        store
            .add(vec![entry("r1", "user-1", "doc-a", vec![1.0, 0.0])])
            .await
            .unwrap();

        let hits = store.similarity_search(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
