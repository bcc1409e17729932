//! Minimal GitHub REST client.
//!
//! Only what the queue worker needs: resolving the changed files of a pull
//! request before ranking. Webhook payloads carry no file list, so the
//! worker fetches it here.

pub mod error;

pub use error::{GithubError, GithubResult};

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::types::FileChange;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("diffscope/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct PrFile {
    filename: String,
    #[serde(default)]
    patch: Option<String>,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
}

pub struct GithubClient {
    client: Client,
    api_base: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(client: Client, token: Option<String>) -> Self {
        Self::with_api_base(client, DEFAULT_API_BASE, token)
    }

    /// `api_base` override exists for tests against a local server.
    pub fn with_api_base(client: Client, api_base: &str, token: Option<String>) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Lists the changed files of a pull request.
    pub async fn list_pr_files(&self, repo: &str, pr_number: u64) -> GithubResult<Vec<FileChange>> {
        let url = format!(
            "{}/repos/{}/pulls/{}/files?per_page=100",
            self.api_base, repo, pr_number
        );

        let mut request = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json");

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GithubError::ApiError {
                status: status.as_u16(),
                url,
            });
        }

        let files: Vec<PrFile> = response.json().await?;
        debug!(repo, pr_number, files = files.len(), "Fetched PR files");

        Ok(files
            .into_iter()
            .map(|f| FileChange {
                filename: f.filename,
                patch: f.patch,
                additions: f.additions,
                deletions: f.deletions,
            })
            .collect())
    }
}
