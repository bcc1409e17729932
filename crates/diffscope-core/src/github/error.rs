//! GitHub API error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("github request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("github api returned {status} for {url}")]
    ApiError { status: u16, url: String },
}

pub type GithubResult<T> = Result<T, GithubError>;
