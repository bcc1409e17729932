//! Pipeline service: the process-wide home of the scorer, index, and
//! embedder.
//!
//! Constructed once at startup and shared by reference. The scorer and the
//! hunk index are lazily initialized on first use behind `OnceCell`s: the
//! first caller loads, subsequent callers reuse, and a failed load latches
//! the documented fallback for the remainder of the process lifetime.


use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::clustering::{ClusterGroup, ClusterItem, SemanticClusterer};
use crate::config::Config;
use crate::embedding::{EmbeddingProvider, provider_from_config};
use crate::github::GithubClient;
use crate::index::{HunkIndex, RetrievalHit};
use crate::queue::TaskHandler;
use crate::ranking::{RankResult, RankingEngine};
use crate::scoring::Scorer;
use crate::types::{FileChange, Task, TaskAction, truncate_chars};

/// Default number of neighbors returned by `retrieve`.
pub const DEFAULT_RETRIEVE_K: usize = 10;

/// Characters of patch text used to build clustering texts.
const CLUSTER_PATCH_CHARS: usize = 256;

/// Error tag returned when retrieval is requested with no index loaded.
pub const RETRIEVAL_UNAVAILABLE: &str = "index_not_loaded";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterResult {
    pub pr_id: String,
    pub groups: Vec<ClusterGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveResult {
    pub results: Vec<RetrievalHit>,
    /// Tag explaining an empty result set; never a request failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct PipelineService {
    config: Config,
    embedder: Arc<dyn EmbeddingProvider>,
    clusterer: SemanticClusterer,
    scorer: OnceCell<Arc<Scorer>>,
    /// `None` inside the cell means the load failed or no index is
    /// configured; either way retrieval stays disabled without retries.
    index: OnceCell<Option<Arc<HunkIndex>>>,
    client: reqwest::Client,
}

impl PipelineService {
    pub fn new(config: Config) -> Self {
        let client = reqwest::Client::new();
        let embedder = provider_from_config(&config, client.clone());

        Self {
            config,
            embedder,
            clusterer: SemanticClusterer::default(),
            scorer: OnceCell::new(),
            index: OnceCell::new(),
            client,
        }
    }

    async fn scorer(&self) -> Arc<Scorer> {
        self.scorer
            .get_or_init(|| async {
                Arc::new(Scorer::init(&self.config, self.client.clone()).await)
            })
            .await
            .clone()
    }

    async fn index(&self) -> Option<Arc<HunkIndex>> {
        self.index
            .get_or_init(|| async {
                let path = self.config.index_path.as_deref()?;
                if !path.exists() {
                    info!(path = %path.display(), "No hunk index found, retrieval unavailable");
                    return None;
                }
                match HunkIndex::load(path) {
                    Ok(index) => Some(Arc::new(index)),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to load hunk index, retrieval unavailable");
                        None
                    }
                }
            })
            .await
            .clone()
    }

    /// Ranks the files of a PR by estimated importance. Never errors for
    /// well-formed input; degraded signals produce degraded scores.
    pub async fn rank_pr(&self, pr_id: &str, repo: &str, files: &[FileChange]) -> RankResult {
        let scorer = self.scorer().await;
        let index = self.index().await;

        let engine = RankingEngine::new(scorer, self.embedder.clone(), index);
        engine.rank_pr(pr_id, repo, files).await
    }

    /// Groups the files of a PR into semantic clusters. Embedding failure
    /// degrades to singleton groups; never errors.
    pub async fn cluster_pr(&self, pr_id: &str, files: &[FileChange]) -> ClusterResult {
        if files.is_empty() {
            return ClusterResult {
                pr_id: pr_id.to_string(),
                groups: Vec::new(),
            };
        }

        let texts: Vec<String> = files
            .iter()
            .map(|f| {
                format!(
                    "// {}\n{}",
                    f.filename,
                    truncate_chars(f.patch.as_deref().unwrap_or(""), CLUSTER_PATCH_CHARS)
                )
            })
            .collect();

        let items: Vec<ClusterItem> = files
            .iter()
            .map(|f| ClusterItem {
                filename: f.filename.clone(),
                patch: f.patch.clone(),
            })
            .collect();

        let embeddings = match self.embedder.embed(&texts).await {
            Ok(embeddings) => embeddings,
            Err(e) => {
                warn!(pr_id, error = %e, "Embedding failed, clustering degrades to singletons");
                Vec::new()
            }
        };

        // An empty embeddings vec trips the clusterer's count-mismatch
        // fallback for inputs of 4+ files; small inputs are singletons
        // regardless.
        let groups = self.clusterer.cluster(&embeddings, &items);

        ClusterResult {
            pr_id: pr_id.to_string(),
            groups,
        }
    }

    /// Retrieves historically similar change fragments for a query diff.
    /// Returns empty results with an error tag when no index is loaded.
    pub async fn retrieve(&self, query_diff: &str, k: usize) -> RetrieveResult {
        let Some(index) = self.index().await else {
            return RetrieveResult {
                results: Vec::new(),
                error: Some(RETRIEVAL_UNAVAILABLE.to_string()),
            };
        };

        let embeddings = match self.embedder.embed(&[query_diff.to_string()]).await {
            Ok(embeddings) => embeddings,
            Err(e) => {
                warn!(error = %e, "Query embedding failed");
                return RetrieveResult {
                    results: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };

        match embeddings.first().map(|q| index.search(q, k)) {
            Some(Ok(results)) => RetrieveResult {
                results,
                error: None,
            },
            Some(Err(e)) => {
                warn!(error = %e, "Index search failed");
                RetrieveResult {
                    results: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
            None => RetrieveResult {
                results: Vec::new(),
                error: None,
            },
        }
    }
}

/// Queue-side dispatcher: resolves missing file lists via the hosting API
/// and invokes the ranking pipeline.
pub struct PipelineHandler {
    pipeline: Arc<PipelineService>,
    github: Arc<GithubClient>,
}

impl PipelineHandler {
    pub fn new(pipeline: Arc<PipelineService>, github: Arc<GithubClient>) -> Self {
        Self { pipeline, github }
    }
}

#[async_trait]
impl TaskHandler for PipelineHandler {
    async fn handle(&self, task: Task) -> anyhow::Result<()> {
        match task.action {
            TaskAction::RankPr => {
                // Webhook tasks arrive with an empty file list; resolve it
                // against the hosting API before ranking.
                let files = if task.files.is_empty() {
                    self.github.list_pr_files(&task.repo, task.pr_id).await?
                } else {
                    task.files
                };

                let result = self
                    .pipeline
                    .rank_pr(&task.pr_id.to_string(), &task.repo, &files)
                    .await;

                info!(
                    pr_id = task.pr_id,
                    repo = %task.repo,
                    ranked = result.ranked_files.len(),
                    processing_ms = result.processing_ms,
                    "Background ranking complete"
                );
                Ok(())
            }
        }
    }
}
