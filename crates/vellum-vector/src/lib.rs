//! Per-user semantic index for Vellum.
//!
//! This crate keeps a user's vector index consistent with their mutable
//! document library: given the library's current rows, a rebuild atomically
//! replaces that user's stale entries with freshly embedded ones, tolerating
//! per-document failures without aborting the whole operation, behind a
//! store port that hides which backend is plugged in.
//!
//! # Features
//!
//! - `vector-lancedb`: Enable the warehouse-style columnar backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      vellum-vector                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider trait                                    │
//! │  └── MockEmbeddingProvider (always available)               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  VectorStore trait                                          │
//! │  ├── MemoryVectorStore (local-index, explicit ids)          │
//! │  └── LancedbStore (columnar-index, feature-gated)           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  DocumentSelector trait (library enumeration boundary)      │
//! │  PayloadBuilder (variant resolution + deterministic ids)    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RebuildEngine (delete-then-batched-add orchestration)      │
//! │  Retriever (query embedding + ranked similarity search)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vellum_vector::{
//!     MemoryVectorStore, MockEmbeddingProvider, RebuildEngine, Retriever,
//!     Scope, VariantPolicy,
//! };
//!
//! let store = Arc::new(MemoryVectorStore::new());
//! let provider = Arc::new(MockEmbeddingProvider::new(384));
//!
//! let engine = RebuildEngine::new(store.clone(), provider.clone());
//! let outcome = engine
//!     .rebuild(&Scope::user("user-1"), &VariantPolicy::Default, sources)
//!     .await?;
//! println!("{}", outcome.summary());
//!
//! let retriever = Retriever::new(store, provider);
//! for hit in retriever.search("orchard pruning", None).await? {
//!     println!("{}: {:.3}", hit.record.metadata.document_id, hit.score);
//! }
//! ```

// Core modules (always available)
pub mod embedding;
pub mod payload;
pub mod rebuild;
pub mod retriever;
pub mod source;
pub mod store;
pub mod types;

// Re-exports — core types
pub use types::{
    BACKEND_COLUMNAR, BACKEND_LOCAL, DEFAULT_SEARCH_LIMIT, EmbeddedRecord, FailureReason,
    IndexRecord, MetadataFilter, RebuildFailure, RebuildOutcome, RecordMetadata, Scope, SearchHit,
    VectorConfig,
};

// Re-exports — traits
pub use embedding::{EmbeddingProvider, MockEmbeddingProvider};
pub use source::{DocumentSelector, SourceRecord, StaticSelector, SummaryKind, SummaryVariant};
pub use store::{MemoryVectorStore, VectorStore, create_vector_store};

// Re-exports — payload and orchestration
pub use payload::{PayloadBuilder, VariantPolicy, payload_id};
pub use rebuild::{RebuildEngine, RebuildRequest};
pub use retriever::{Retriever, SearchRequest};

// Feature-gated re-exports
#[cfg(feature = "vector-lancedb")]
pub use store::LancedbStore;

// ============================================================================
// End-to-end tests
// ============================================================================
