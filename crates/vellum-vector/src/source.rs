//! Source records and the document selector boundary.
//!
//! A rebuild consumes an ordered sequence of source record handles produced
//! by collaborators outside this crate (the relational document store). The
//! `DocumentSelector` trait is that boundary; `StaticSelector` is the
//! in-crate implementation over an already-loaded sequence, used by tests
//! and by callers that hold the rows themselves.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vellum_core::Result;

use crate::types::Scope;

/// Which kind of derived summary a variant is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryKind {
    /// The stock summary produced at ingestion time.
    Default,
    /// A summary produced from a user-chosen prompt.
    Custom,
}

/// One derived summary attached to a source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryVariant {
    /// Kind of summary.
    pub kind: SummaryKind,

    /// Prompt that produced a custom summary, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<String>,

    /// Summary text; may be blank when generation failed upstream.
    pub text: String,
}

impl SummaryVariant {
    /// A default summary.
    pub fn default_summary(text: impl Into<String>) -> Self {
        Self {
            kind: SummaryKind::Default,
            prompt_id: None,
            text: text.into(),
        }
    }

    /// A custom summary without prompt attribution.
    pub fn custom(text: impl Into<String>) -> Self {
        Self {
            kind: SummaryKind::Custom,
            prompt_id: None,
            text: text.into(),
        }
    }

    /// A custom summary produced by a specific prompt.
    pub fn custom_with_prompt(prompt_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: SummaryKind::Custom,
            prompt_id: Some(prompt_id.into()),
            text: text.into(),
        }
    }

    /// Whether this variant carries usable (non-blank) text.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// An opaque handle to one library entry: document identity, link identity,
/// and the derived summaries available for embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Source document identity.
    pub document_id: String,

    /// Link joining the document into the user's library, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_id: Option<String>,

    /// Document title, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Full document text, used when no summary resolves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_text: Option<String>,

    /// Derived summaries, in storage order.
    #[serde(default)]
    pub summaries: Vec<SummaryVariant>,
}

impl SourceRecord {
    /// Create a source record for a document.
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            link_id: None,
            title: None,
            document_text: None,
            summaries: Vec::new(),
        }
    }

    /// Set the link identity.
    pub fn with_link(mut self, link_id: impl Into<String>) -> Self {
        self.link_id = Some(link_id.into());
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the full document text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.document_text = Some(text.into());
        self
    }

    /// Attach a summary variant.
    pub fn with_summary(mut self, summary: SummaryVariant) -> Self {
        self.summaries.push(summary);
        self
    }

    /// Whether the record carries enough identity to be indexed at all.
    pub fn is_complete(&self) -> bool {
        !self.document_id.trim().is_empty()
    }
}

/// Boundary trait for enumerating a scope's eligible source records.
///
/// Production implementations live beside the relational document store.
/// Implementations are expected to filter out incomplete records
/// (see [`SourceRecord::is_complete`]).
#[async_trait]
pub trait DocumentSelector: Send + Sync {
    /// Enumerate the source records for a scope, in storage order.
    async fn select(&self, scope: &Scope) -> Result<Vec<SourceRecord>>;

    /// Selector name for diagnostics.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// A selector over an already-loaded, already-scoped sequence of records.
#[derive(Debug, Clone, Default)]
pub struct StaticSelector {
    records: Vec<SourceRecord>,
}

impl StaticSelector {
    /// Create a selector over a fixed sequence.
    pub fn new(records: Vec<SourceRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl DocumentSelector for StaticSelector {
    async fn select(&self, _scope: &Scope) -> Result<Vec<SourceRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.is_complete())
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_record_builder() {
        let record = SourceRecord::new("doc-1")
            .with_link("link-1")
            .with_title("Field Notes")
            .with_text("full body")
            .with_summary(SummaryVariant::default_summary("a summary"));

        assert_eq!(record.document_id, "doc-1");
        assert_eq!(record.link_id.as_deref(), Some("link-1"));
        assert_eq!(record.title.as_deref(), Some("Field Notes"));
        assert_eq!(record.summaries.len(), 1);
        assert!(record.is_complete());
    }

    #[test]
    fn test_incomplete_record() {
        assert!(!SourceRecord::new("").is_complete());
        assert!(!SourceRecord::new("   ").is_complete());
    }

    #[test]
    fn test_summary_has_text() {
        assert!(SummaryVariant::default_summary("text").has_text());
        assert!(!SummaryVariant::default_summary("").has_text());
        assert!(!SummaryVariant::custom("  \n ").has_text());
    }

    #[tokio::test]
    async fn test_static_selector_filters_incomplete() {
        let selector = StaticSelector::new(vec![
            SourceRecord::new("doc-1").with_text("text"),
            SourceRecord::new(""),
            SourceRecord::new("doc-2"),
        ]);

        let records = selector.select(&Scope::user("user-1")).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].document_id, "doc-1");
        assert_eq!(records[1].document_id, "doc-2");
        assert_eq!(selector.name(), "static");
    }

    #[test]
    fn test_summary_variant_serialization() {
        let variant = SummaryVariant::custom_with_prompt("prompt-7", "summary text");
        let json = serde_json::to_string(&variant).unwrap();
        assert!(json.contains("\"custom\""));
        assert!(json.contains("prompt-7"));

        let plain = SummaryVariant::default_summary("s");
        let json = serde_json::to_string(&plain).unwrap();
        assert!(!json.contains("prompt_id"));
    }
}
