//! Query-side retrieval: text in, ranked documents out.
//!
//! Embeds the query once (no caching), delegates to the store's similarity
//! search, and never mutates the index. A failed query embedding is a hard
//! error — there is no vector to search with.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};
use vellum_core::Result;

use crate::embedding::EmbeddingProvider;
use crate::store::VectorStore;
use crate::types::{DEFAULT_SEARCH_LIMIT, SearchHit};

/// A search request: query text and an optional result bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query text to embed.
    pub query: String,

    /// Maximum results; the retriever's default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,
}

impl SearchRequest {
    /// Create a request with the default result bound.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            k: None,
        }
    }

    /// Bound the result count.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = Some(k);
        self
    }
}

/// Read-only similarity search over the vector store.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    provider: Arc<dyn EmbeddingProvider>,
    default_k: usize,
}

impl Retriever {
    /// Create a retriever with the stock default result bound.
    pub fn new(store: Arc<dyn VectorStore>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            store,
            provider,
            default_k: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Override the default result bound (e.g., from `VectorConfig`).
    pub fn with_default_k(mut self, default_k: usize) -> Self {
        self.default_k = default_k;
        self
    }

    /// Search for the `k` most similar documents, highest score first.
    ///
    /// Fewer than `k` hits are returned when the store holds fewer entries.
    pub async fn search(&self, query: &str, k: Option<usize>) -> Result<Vec<SearchHit>> {
        let k = k.unwrap_or(self.default_k);
        debug!("searching (k={k}) via {}", self.store.name());

        let vector = self.provider.embed(query).await?;
        self.store.similarity_search(&vector, k).await
    }

    /// Convenience wrapper over [`search`](Self::search) for a request value.
    pub async fn search_request(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        self.search(&request.query, request.k).await
    }
}

// ============================================================================
// Tests
// ============================================================================
