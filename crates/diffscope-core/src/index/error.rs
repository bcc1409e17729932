//! Hunk index error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    /// `search` was called before `build` or `load`.
    #[error("index not built: call build() or load() first")]
    NotBuilt,

    #[error("vector count mismatch: {vectors} vectors, {metadata} metadata entries")]
    LengthMismatch { vectors: usize, metadata: usize },

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index file is corrupt: {reason}")]
    Corrupt { reason: String },

    /// Blob and metadata sidecar disagree, so neither can be trusted.
    #[error("index blob holds {blob} entries but sidecar {path} holds {sidecar}")]
    SidecarMismatch {
        blob: usize,
        sidecar: usize,
        path: PathBuf,
    },

    #[error("index io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata sidecar error: {0}")]
    Sidecar(#[from] serde_json::Error),
}

pub type IndexResult<T> = Result<T, IndexError>;
