//! Error types for Vellum operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across all Vellum crates. Uses `thiserror` for derive macros.
//!
//! # Propagation policy
//!
//! Per-item problems during an index rebuild (a document with no usable
//! summary, one failed embedding) are absorbed into the rebuild outcome's
//! failure list and never surface as an `Error`. Whole-operation problems
//! (an unresolvable scope, a failed scope delete, a failed query embedding)
//! abort and surface as one of the variants below.

use thiserror::Error;

/// Errors that can occur in Vellum operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Content not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A rebuild or search scope that resolves to no identifiable owner.
    ///
    /// Rejected before any index mutation is attempted.
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// The embedding provider failed to produce a vector.
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// A vector store backend call (delete, add, search) failed.
    #[error("Vector store error: {0}")]
    Backend(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create an invalid scope error.
    pub fn invalid_scope(msg: impl Into<String>) -> Self {
        Self::InvalidScope(msg.into())
    }

    /// Create an embedding error.
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    /// Create a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Whether this error aborted the operation before any index mutation.
    pub fn is_pre_flight(&self) -> bool {
        matches!(self, Self::InvalidScope(_) | Self::Config(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using Vellum's Error type.
pub type Result<T> = std::result::Result<T, Error>;
