//! Error types for annotation operations.

use thiserror::Error;

/// Errors that can occur while touching the document or the host.
///
/// None of these are fatal to the engine: a failed replacement leaves the
/// node unannotated until the next pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnnotateError {
    /// The node lost its parent before it could be replaced.
    #[error("node detached from document")]
    Detached,

    /// A DOM call was rejected.
    #[error("DOM operation failed: {0}")]
    Dom(String),

    /// The host content query failed.
    #[error("host query failed: {0}")]
    Query(String),

    /// Configuration could not be decoded.
    #[error("invalid configuration: {0}")]
    Config(String),
}
