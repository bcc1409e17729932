//! Pipeline endpoints: ranking, clustering, retrieval.
//!
//! These handlers never return an error status for well-formed input; the
//! pipeline degrades internally instead.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use diffscope::pipeline::{ClusterResult, DEFAULT_RETRIEVE_K, RetrieveResult};
use diffscope::ranking::RankResult;
use diffscope::types::FileChange;

use crate::gateway::state::HandlerState;

#[derive(Debug, Deserialize)]
pub struct RankRequest {
    pub pr_id: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub files: Vec<FileChange>,
}

#[derive(Debug, Deserialize)]
pub struct ClusterRequest {
    pub pr_id: String,
    #[serde(default)]
    pub files: Vec<FileChange>,
}

#[derive(Debug, Deserialize)]
pub struct RetrieveRequest {
    pub query_diff: String,
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    DEFAULT_RETRIEVE_K
}

#[instrument(skip(state, request), fields(pr_id = %request.pr_id, files = request.files.len()))]
pub async fn rank_handler(
    State(state): State<HandlerState>,
    Json(request): Json<RankRequest>,
) -> Json<RankResult> {
    let result = state
        .pipeline
        .rank_pr(&request.pr_id, &request.repo, &request.files)
        .await;
    Json(result)
}

#[instrument(skip(state, request), fields(pr_id = %request.pr_id, files = request.files.len()))]
pub async fn cluster_handler(
    State(state): State<HandlerState>,
    Json(request): Json<ClusterRequest>,
) -> Json<ClusterResult> {
    let result = state.pipeline.cluster_pr(&request.pr_id, &request.files).await;
    Json(result)
}

#[instrument(skip(state, request), fields(k = request.k))]
pub async fn retrieve_handler(
    State(state): State<HandlerState>,
    Json(request): Json<RetrieveRequest>,
) -> Json<RetrieveResult> {
    let result = state.pipeline.retrieve(&request.query_diff, request.k).await;
    Json(result)
}
