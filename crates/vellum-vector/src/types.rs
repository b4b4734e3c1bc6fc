//! Common types for the Vellum semantic index.
//!
//! These types are shared by the store backends, the rebuild engine, and the
//! retriever, and are always available regardless of feature flags.

use serde::{Deserialize, Serialize};
use vellum_core::{Error, Result};

/// Backend tag for the embedded in-memory similarity index.
pub const BACKEND_LOCAL: &str = "local-index";

/// Backend tag for the warehouse-style columnar index.
pub const BACKEND_COLUMNAR: &str = "columnar-index";

/// Default number of search results when the caller does not override `k`.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

// ============================================================================
// Configuration
// ============================================================================

/// Vector index configuration.
///
/// Constructed once at startup and passed by reference into the store
/// factory, the rebuild engine, and the retriever. There is no ambient
/// global configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    /// Backend kind: "local-index" or "columnar-index".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Embedding model name (e.g., "bge-small-en-v1.5").
    #[serde(default = "default_model")]
    pub model: String,

    /// Embedding dimension (derived from the first batch if 0).
    #[serde(default)]
    pub dimension: usize,

    /// Path to the columnar database directory (columnar-index only).
    pub db_path: Option<String>,

    /// Table name for the columnar backend.
    #[serde(default = "default_table")]
    pub table_name: String,

    /// Default search result limit.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

fn default_backend() -> String {
    BACKEND_LOCAL.to_string()
}

fn default_model() -> String {
    "bge-small-en-v1.5".to_string()
}

fn default_table() -> String {
    "vellum_vectors".to_string()
}

fn default_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            model: default_model(),
            dimension: 0,
            db_path: None,
            table_name: default_table(),
            default_limit: default_limit(),
        }
    }
}

// ============================================================================
// Records and metadata
// ============================================================================

/// Metadata carried by every indexed record.
///
/// An explicit schema rather than a free-form map, so backend adapters can
/// rely on field presence. `user_id` and `document_id` are always set;
/// the rest are optional scalars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Owner of the indexed entry.
    pub user_id: String,

    /// Source document identity.
    pub document_id: String,

    /// Link joining the document into the user's library, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_id: Option<String>,

    /// Resolved variant identity ("default", "custom", "custom:<prompt>",
    /// or "fulltext").
    pub variant: String,

    /// Document title snapshot, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl RecordMetadata {
    /// Validate the required fields.
    ///
    /// Called at the payload-builder boundary so no record with a blank
    /// owner or document identity can reach a backend.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(Error::invalid_data("record metadata missing user_id"));
        }
        if self.document_id.trim().is_empty() {
            return Err(Error::invalid_data("record metadata missing document_id"));
        }
        Ok(())
    }
}

/// One entry submitted to the vector store for indexing.
///
/// Records are produced transiently per rebuild and never mutated in place;
/// a changed document produces a new payload with the same deterministic id,
/// replacing the old entry via delete-then-add.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Stable identifier, derived from (scope, document, variant).
    ///
    /// Advisory on backends that assign their own row ids.
    pub id: String,

    /// Text that was (or will be) embedded.
    pub text: String,

    /// Metadata snapshot.
    pub metadata: RecordMetadata,
}

impl IndexRecord {
    /// Create a new index record.
    pub fn new(id: impl Into<String>, text: impl Into<String>, metadata: RecordMetadata) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
        }
    }
}

/// An index record with its computed embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedRecord {
    /// The record being indexed.
    pub record: IndexRecord,

    /// The embedding vector.
    pub vector: Vec<f32>,
}

impl EmbeddedRecord {
    /// Create a new embedded record.
    pub fn new(record: IndexRecord, vector: Vec<f32>) -> Self {
        Self { record, vector }
    }

    /// The embedding dimension.
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

// ============================================================================
// Scope and filtering
// ============================================================================

/// The subset of the index a rebuild may touch: one user's entries.
///
/// A rebuild for scope S never deletes or inserts records outside S.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Owner whose entries are being replaced.
    pub user_id: String,
}

impl Scope {
    /// Create a scope for a single user.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// Reject scopes that resolve to no identifiable owner.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(Error::invalid_scope("scope has no user id"));
        }
        Ok(())
    }

    /// The metadata filter selecting this scope's entries.
    pub fn filter(&self) -> MetadataFilter {
        MetadataFilter::user(&self.user_id)
    }
}

/// Exact-equality filter over the named metadata fields.
///
/// All set fields must match; unset fields are ignored. An empty filter
/// matches everything and is rejected by the store adapters, so a malformed
/// caller cannot wipe entries across scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilter {
    /// Match on the owning user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Match on the source document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,

    /// Match on the resolved variant identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl MetadataFilter {
    /// Filter on the owning user.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    /// Additionally match on the source document.
    pub fn with_document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    /// Additionally match on the resolved variant.
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.document_id.is_none() && self.variant.is_none()
    }

    /// Whether the given metadata matches every set field exactly.
    pub fn matches(&self, metadata: &RecordMetadata) -> bool {
        if let Some(ref user_id) = self.user_id
            && user_id != &metadata.user_id
        {
            return false;
        }
        if let Some(ref document_id) = self.document_id
            && document_id != &metadata.document_id
        {
            return false;
        }
        if let Some(ref variant) = self.variant
            && variant != &metadata.variant
        {
            return false;
        }
        true
    }
}

// ============================================================================
// Search results
// ============================================================================

/// A single similarity search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// View of the indexed record.
    pub record: IndexRecord,

    /// Similarity score; higher is more similar on every backend.
    pub score: f32,
}

// ============================================================================
// Rebuild accounting
// ============================================================================

/// Why a single source record did not make it into the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// No resolvable summary or document text for the requested variant.
    NoContent,
    /// The embedding provider failed for this record.
    Embedding(String),
    /// The batched store write failed; the whole batch carries this reason.
    Write(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoContent => write!(f, "no content"),
            Self::Embedding(msg) => write!(f, "embedding failed: {msg}"),
            Self::Write(msg) => write!(f, "store write failed: {msg}"),
        }
    }
}

/// A per-item rebuild failure: which document, and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildFailure {
    /// Source document identity.
    pub document_id: String,
    /// Failure reason.
    pub reason: FailureReason,
}

/// Result of one rebuild call.
///
/// Invariant: `succeeded + failed == total`, where `total` counts the source
/// records considered (skips included, as failures with a "no content"
/// reason).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RebuildOutcome {
    /// Records successfully written to the index.
    pub succeeded: usize,

    /// Records that were skipped or failed.
    pub failed: usize,

    /// Source records considered.
    pub total: usize,

    /// Per-item failure reasons.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<RebuildFailure>,
}

impl RebuildOutcome {
    /// Create an outcome for `total` source records, none processed yet.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Record one successfully indexed record.
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    /// Record one failed or skipped record with its reason.
    pub fn record_failure(&mut self, document_id: impl Into<String>, reason: FailureReason) {
        self.failed += 1;
        self.failures.push(RebuildFailure {
            document_id: document_id.into(),
            reason,
        });
    }

    /// Human-readable summary of the counts.
    pub fn summary(&self) -> String {
        format!(
            "indexed {} of {} documents ({} failed)",
            self.succeeded, self.total, self.failed
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> RecordMetadata {
        RecordMetadata {
            user_id: "user-1".to_string(),
            document_id: "doc-1".to_string(),
            link_id: Some("link-1".to_string()),
            variant: "default".to_string(),
            title: Some("A Title".to_string()),
        }
    }

    // ------------------------------------------------------------------------
    // VectorConfig tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_vector_config_default() {
        let config = VectorConfig::default();
        assert_eq!(config.backend, BACKEND_LOCAL);
        assert_eq!(config.model, "bge-small-en-v1.5");
        assert_eq!(config.dimension, 0);
        assert!(config.db_path.is_none());
        assert_eq!(config.table_name, "vellum_vectors");
        assert_eq!(config.default_limit, DEFAULT_SEARCH_LIMIT);
    }

    #[test]
    fn test_vector_config_deserialization_with_defaults() {
        let json = r#"{"backend": "columnar-index", "db_path": "/tmp/vectors"}"#;
        let config: VectorConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.backend, BACKEND_COLUMNAR);
        assert_eq!(config.db_path.as_deref(), Some("/tmp/vectors"));
        assert_eq!(config.default_limit, 5);
        assert_eq!(config.table_name, "vellum_vectors");
    }

    // ------------------------------------------------------------------------
    // Metadata tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_metadata_validate() {
        assert!(sample_metadata().validate().is_ok());

        let mut missing_user = sample_metadata();
        missing_user.user_id = "  ".to_string();
        assert!(missing_user.validate().is_err());

        let mut missing_doc = sample_metadata();
        missing_doc.document_id = String::new();
        assert!(missing_doc.validate().is_err());
    }

    #[test]
    fn test_metadata_serialization_skips_none() {
        let mut metadata = sample_metadata();
        metadata.link_id = None;
        metadata.title = None;

        let json = serde_json::to_string(&metadata).unwrap();
        assert!(!json.contains("link_id"));
        assert!(!json.contains("title"));
        assert!(json.contains("user-1"));
    }

    // ------------------------------------------------------------------------
    // Scope and filter tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_scope_validate() {
        assert!(Scope::user("user-1").validate().is_ok());
        assert!(Scope::user("").validate().is_err());
        assert!(Scope::user("   ").validate().is_err());
    }

    #[test]
    fn test_scope_filter() {
        let filter = Scope::user("user-1").filter();
        assert_eq!(filter.user_id.as_deref(), Some("user-1"));
        assert!(filter.document_id.is_none());
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_filter_matches_all_set_fields() {
        let metadata = sample_metadata();

        assert!(MetadataFilter::user("user-1").matches(&metadata));
        assert!(
            MetadataFilter::user("user-1")
                .with_document("doc-1")
                .matches(&metadata)
        );
        assert!(
            MetadataFilter::user("user-1")
                .with_variant("default")
                .matches(&metadata)
        );

        assert!(!MetadataFilter::user("user-2").matches(&metadata));
        assert!(
            !MetadataFilter::user("user-1")
                .with_document("doc-9")
                .matches(&metadata)
        );
    }

    #[test]
    fn test_filter_exact_equality_not_substring() {
        let metadata = sample_metadata();
        assert!(!MetadataFilter::user("user").matches(&metadata));
        assert!(!MetadataFilter::user("user-10").matches(&metadata));
    }

    #[test]
    fn test_empty_filter() {
        let filter = MetadataFilter::default();
        assert!(filter.is_empty());
        // An empty filter matches everything; adapters must reject it.
        assert!(filter.matches(&sample_metadata()));
    }

    // ------------------------------------------------------------------------
    // RebuildOutcome tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_outcome_accounting() {
        let mut outcome = RebuildOutcome::new(3);
        outcome.record_success();
        outcome.record_success();
        outcome.record_failure("doc-3", FailureReason::NoContent);

        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.succeeded + outcome.failed, outcome.total);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].document_id, "doc-3");
        assert_eq!(outcome.failures[0].reason, FailureReason::NoContent);
    }

    #[test]
    fn test_outcome_summary() {
        let mut outcome = RebuildOutcome::new(3);
        outcome.record_success();
        outcome.record_failure("doc-2", FailureReason::NoContent);
        outcome.record_failure("doc-3", FailureReason::Embedding("timeout".to_string()));

        assert_eq!(outcome.summary(), "indexed 1 of 3 documents (2 failed)");
    }

    #[test]
    fn test_failure_reason_display() {
        assert_eq!(FailureReason::NoContent.to_string(), "no content");
        assert_eq!(
            FailureReason::Write("refused".to_string()).to_string(),
            "store write failed: refused"
        );
    }

    #[test]
    fn test_outcome_serialization_skips_empty_failures() {
        let outcome = RebuildOutcome::new(0);
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(!json.contains("failures"));
    }
}
