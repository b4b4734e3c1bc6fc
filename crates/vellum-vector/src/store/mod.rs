//! Vector store port: one contract, two structurally different backends.
//!
//! The rebuild engine and the retriever depend only on [`VectorStore`].
//! Backend selection happens once, in [`create_vector_store`], from the
//! configuration. The single backend distinction the engine may observe is
//! [`VectorStore::supplies_ids`], which picks the id-supplying strategy on
//! add.

use std::sync::Arc;

use async_trait::async_trait;
use vellum_core::{Error, Result};

use crate::types::{
    BACKEND_COLUMNAR, BACKEND_LOCAL, EmbeddedRecord, MetadataFilter, SearchHit, VectorConfig,
};

pub mod memory;

#[cfg(feature = "vector-lancedb")]
pub mod lancedb;

pub use memory::MemoryVectorStore;

#[cfg(feature = "vector-lancedb")]
pub use lancedb::LancedbStore;

/// Capability interface every vector backend satisfies.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert a batch of embedded records in one call.
    ///
    /// An empty batch is a no-op. The call is assumed atomic-or-nothing:
    /// the rebuild engine gives no partial credit for a failed add and does
    /// not chunk-and-retry. Backends without that transactional guarantee
    /// must add chunked retry themselves.
    async fn add(&self, records: Vec<EmbeddedRecord>) -> Result<()>;

    /// Delete every record whose metadata matches all set filter fields.
    ///
    /// Exact equality, not substring match. Zero matches is a no-op. An
    /// empty filter is rejected with `Error::InvalidData` — it would match
    /// every scope.
    async fn delete_where(&self, filter: &MetadataFilter) -> Result<()>;

    /// Nearest-neighbor search, at most `k` hits, highest score first.
    ///
    /// Score semantics are uniform across backends: higher is more similar.
    /// Distance-based backends convert before returning.
    async fn similarity_search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>>;

    /// Whether this backend indexes by caller-supplied ids.
    ///
    /// When false, record ids are advisory and the rebuild engine strips
    /// them before calling [`add`](Self::add).
    fn supplies_ids(&self) -> bool;

    /// Backend name for diagnostics.
    fn name(&self) -> &str;

    /// Number of records currently held.
    async fn count(&self) -> Result<usize>;
}

/// Resolve the configured backend into a store instance.
///
/// Called once at startup; everything downstream holds the trait object.
pub async fn create_vector_store(config: &VectorConfig) -> Result<Arc<dyn VectorStore>> {
    match config.backend.as_str() {
        BACKEND_LOCAL => Ok(Arc::new(MemoryVectorStore::new())),
        #[cfg(feature = "vector-lancedb")]
        BACKEND_COLUMNAR => {
            let db_path = config.db_path.as_deref().ok_or_else(|| {
                Error::config("columnar-index backend requires db_path")
            })?;
            let store = LancedbStore::connect(db_path, &config.table_name).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "vector-lancedb"))]
        BACKEND_COLUMNAR => Err(Error::config(
            "columnar-index backend requires the vector-lancedb feature",
        )),
        other => Err(Error::config(format!("unknown vector backend: {other}"))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_factory_local_backend() {
        let config = VectorConfig::default();
        let store = create_vector_store(&config).await.unwrap();
        assert_eq!(store.name(), BACKEND_LOCAL);
        assert!(store.supplies_ids());
    }

    #[tokio::test]
    async fn test_factory_unknown_backend() {
        let config = VectorConfig {
            backend: "graph-index".to_string(),
            ..Default::default()
        };
        assert!(create_vector_store(&config).await.is_err());
    }

    #[cfg(not(feature = "vector-lancedb"))]
    #[tokio::test]
    async fn test_factory_columnar_requires_feature() {
        let config = VectorConfig {
            backend: BACKEND_COLUMNAR.to_string(),
            db_path: Some("/tmp/db".to_string()),
            ..Default::default()
        };
        assert!(create_vector_store(&config).await.is_err());
    }

    #[cfg(feature = "vector-lancedb")]
    #[tokio::test]
    async fn test_factory_columnar_requires_db_path() {
        let config = VectorConfig {
            backend: BACKEND_COLUMNAR.to_string(),
            db_path: None,
            ..Default::default()
        };
        assert!(create_vector_store(&config).await.is_err());
    }

    #[test]
    fn test_trait_object_safety() {
        fn _assert_object_safe(_: &dyn VectorStore) {}
    }
}
