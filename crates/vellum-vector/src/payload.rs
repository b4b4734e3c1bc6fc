//! Payload construction: from a source record to an indexable entry.
//!
//! The builder is a pure transformation. It resolves exactly one candidate
//! text body per source record according to the variant policy, derives a
//! deterministic id from (scope, document, resolved variant), and returns
//! `None` when no candidate resolves — a skip, never an error.
//!
//! # Candidate precedence
//!
//! 1. Custom summary matching the requested prompt id (prompt policy only)
//! 2. Any custom summary with text (prompt and custom policies)
//! 3. The default summary
//! 4. The full document text
//!
//! The first candidate with non-blank text wins.

use serde::{Deserialize, Serialize};

use crate::source::{SourceRecord, SummaryKind};
use crate::types::{IndexRecord, RecordMetadata, Scope};

/// Which derived text to embed for each document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantPolicy {
    /// Embed the default summary.
    #[default]
    Default,
    /// Prefer any custom summary over the default.
    Custom,
    /// Prefer the custom summary produced by this prompt.
    Prompt(String),
}

/// Derive the stable payload id for (scope, document, resolved variant).
///
/// Repeated builds of the same input reproduce the same id, so backends
/// that index by explicit id overwrite rather than accumulate. A field
/// separator keeps `("ab", "c")` and `("a", "bc")` distinct.
pub fn payload_id(user_id: &str, document_id: &str, variant: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(user_id.as_bytes());
    hasher.update(&[0x1f]);
    hasher.update(document_id.as_bytes());
    hasher.update(&[0x1f]);
    hasher.update(variant.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Builds index payloads for one scope under one variant policy.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    scope: Scope,
    policy: VariantPolicy,
}

impl PayloadBuilder {
    /// Create a builder for a scope and policy.
    pub fn new(scope: Scope, policy: VariantPolicy) -> Self {
        Self { scope, policy }
    }

    /// Build the index record for one source record.
    ///
    /// Returns `None` when the record is missing its document identity or
    /// no candidate text resolves under the policy.
    pub fn build(&self, source: &SourceRecord) -> Option<IndexRecord> {
        if !source.is_complete() {
            return None;
        }

        let (variant, text) = self.resolve(source)?;
        let id = payload_id(&self.scope.user_id, &source.document_id, &variant);

        let metadata = RecordMetadata {
            user_id: self.scope.user_id.clone(),
            document_id: source.document_id.clone(),
            link_id: source.link_id.clone(),
            variant,
            title: source.title.clone(),
        };

        Some(IndexRecord::new(id, text, metadata))
    }

    /// Resolve the (variant identity, text) pair for a source record.
    fn resolve(&self, source: &SourceRecord) -> Option<(String, String)> {
        if let VariantPolicy::Prompt(ref prompt_id) = self.policy {
            let matched = source.summaries.iter().find(|s| {
                s.kind == SummaryKind::Custom
                    && s.prompt_id.as_deref() == Some(prompt_id.as_str())
                    && s.has_text()
            });
            if let Some(summary) = matched {
                return Some((format!("custom:{prompt_id}"), summary.text.clone()));
            }
        }

        if matches!(self.policy, VariantPolicy::Custom | VariantPolicy::Prompt(_)) {
            let custom = source
                .summaries
                .iter()
                .find(|s| s.kind == SummaryKind::Custom && s.has_text());
            if let Some(summary) = custom {
                return Some(("custom".to_string(), summary.text.clone()));
            }
        }

        let default = source
            .summaries
            .iter()
            .find(|s| s.kind == SummaryKind::Default && s.has_text());
        if let Some(summary) = default {
            return Some(("default".to_string(), summary.text.clone()));
        }

        match source.document_text {
            Some(ref text) if !text.trim().is_empty() => {
                Some(("fulltext".to_string(), text.clone()))
            }
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
