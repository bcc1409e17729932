//! Scoring error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("scoring request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("inference endpoint returned {status}: {body}")]
    EndpointError { status: u16, body: String },

    #[error("score count mismatch: sent {sent} texts, got {received} scores")]
    CountMismatch { sent: usize, received: usize },
}

pub type ScoringResult<T> = Result<T, ScoringError>;
