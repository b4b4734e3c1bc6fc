//! Vellum Core — shared errors and types.
//!
//! This crate provides the foundational types used across all Vellum crates.
//! It has no internal Vellum dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias

pub mod error;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
