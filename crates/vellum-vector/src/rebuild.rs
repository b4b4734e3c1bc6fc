//! The rebuild engine: atomically replace one scope's index entries.
//!
//! A rebuild runs delete-then-batched-add for one user's scope:
//!
//! 1. Validate the scope (rejected before any index mutation).
//! 2. Delete the scope's entries in one filtered call — so a rebuild is
//!    idempotent under retry and a partial earlier failure never leaves
//!    duplicates behind.
//! 3. Build one payload per source record; records with no resolvable text
//!    are counted as failed with a "no content" reason, never raised.
//! 4. Embed the built payloads concurrently per document.
//! 5. Insert the whole batch in a single add call.
//!
//! Per-item problems land in the outcome's failure list; whole-operation
//! problems (invalid scope, failed delete) abort and surface as an error.
//! A failed batched add marks every batch item failed but still returns a
//! structured outcome, so callers always receive an accounting.
//!
//! Two concurrent rebuilds of the same scope are not coordinated here and
//! can interleave delete/add; callers must serialize rebuilds per scope.
//! An abort between delete and add leaves the scope empty until retried,
//! which the idempotent delete-then-add sequence repairs.

use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use vellum_core::Result;

use crate::embedding::EmbeddingProvider;
use crate::payload::{PayloadBuilder, VariantPolicy};
use crate::source::{DocumentSelector, SourceRecord};
use crate::store::VectorStore;
use crate::types::{EmbeddedRecord, FailureReason, RebuildOutcome, Scope};

/// Logical rebuild request: which scope, and which variant to embed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildRequest {
    /// Owner whose index entries are being replaced.
    pub scope_id: String,

    /// Which derived text to embed per document.
    #[serde(default)]
    pub policy: VariantPolicy,
}

impl RebuildRequest {
    /// The scope this request addresses.
    pub fn scope(&self) -> Scope {
        Scope::user(&self.scope_id)
    }
}

/// Coordinates delete-then-batched-add for one scope at a time.
pub struct RebuildEngine {
    store: Arc<dyn VectorStore>,
    provider: Arc<dyn EmbeddingProvider>,
}

impl RebuildEngine {
    /// Create an engine over a store and an embedding provider.
    pub fn new(store: Arc<dyn VectorStore>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, provider }
    }

    /// Rebuild a scope's index entries from the given source records.
    ///
    /// `sources` is the selector result: the scope's current library rows,
    /// in storage order. Returns the outcome accounting even under partial
    /// failure; errors only when the scope is invalid or the scope delete
    /// fails (proceeding without a clean slate would risk duplicates).
    pub async fn rebuild(
        &self,
        scope: &Scope,
        policy: &VariantPolicy,
        sources: Vec<SourceRecord>,
    ) -> Result<RebuildOutcome> {
        scope.validate()?;

        let total = sources.len();
        info!(
            "rebuilding index for user {} ({} source records, backend {})",
            scope.user_id,
            total,
            self.store.name()
        );

        // Delete once, before any insert. Still runs for an empty selector
        // result: it clears residual entries of a now-empty scope.
        self.store.delete_where(&scope.filter()).await.inspect_err(|e| {
            warn!("scope delete failed for user {}: {e}", scope.user_id);
        })?;

        let mut outcome = RebuildOutcome::new(total);
        let builder = PayloadBuilder::new(scope.clone(), policy.clone());

        let mut payloads = Vec::with_capacity(total);
        for source in &sources {
            match builder.build(source) {
                Some(record) => payloads.push(record),
                None => {
                    debug!(
                        "skipping document {} for user {}: no content",
                        source.document_id, scope.user_id
                    );
                    outcome.record_failure(source.document_id.clone(), FailureReason::NoContent);
                }
            }
        }

        // Embed concurrently per document; the delete above and the add
        // below stay single serialized calls.
        let embeddings =
            futures::future::join_all(payloads.iter().map(|p| self.provider.embed(&p.text)))
                .await;

        let mut batch = Vec::with_capacity(payloads.len());
        for (record, embedding) in payloads.into_iter().zip(embeddings) {
            match embedding {
                Ok(vector) => batch.push(EmbeddedRecord::new(record, vector)),
                Err(e) => {
                    warn!(
                        "embedding failed for document {}: {e}",
                        record.metadata.document_id
                    );
                    outcome.record_failure(
                        record.metadata.document_id.clone(),
                        FailureReason::Embedding(e.to_string()),
                    );
                }
            }
        }

        // Auto-id backends ignore record ids; strip them so nothing
        // downstream depends on values the backend never stored.
        if !self.store.supplies_ids() {
            for entry in &mut batch {
                entry.record.id.clear();
            }
        }

        let batch_documents: Vec<String> = batch
            .iter()
            .map(|e| e.record.metadata.document_id.clone())
            .collect();

        match self.store.add(batch).await {
            Ok(()) => {
                for _ in &batch_documents {
                    outcome.record_success();
                }
            }
            Err(e) => {
                // No partial credit: the add is atomic-or-nothing per call.
                warn!("batched add failed for user {}: {e}", scope.user_id);
                for document_id in batch_documents {
                    outcome.record_failure(document_id, FailureReason::Write(e.to_string()));
                }
            }
        }

        info!("rebuild for user {}: {}", scope.user_id, outcome.summary());
        Ok(outcome)
    }

    /// Run the selector for the scope, then rebuild from its records.
    pub async fn rebuild_with_selector(
        &self,
        scope: &Scope,
        policy: &VariantPolicy,
        selector: &dyn DocumentSelector,
    ) -> Result<RebuildOutcome> {
        scope.validate()?;
        let sources = selector.select(scope).await?;
        self.rebuild(scope, policy, sources).await
    }
}

// ============================================================================
// Tests
// ============================================================================
