//! Blends scorer and retrieval signals into a single per-file ordering.
//!
//! Every path through here is best-effort: a missing index or a failing
//! scorer degrades the scores, never the request.

#[cfg(test)]
mod tests;

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::embedding::EmbeddingProvider;
use crate::index::HunkIndex;
use crate::scoring::Scorer;
use crate::types::{FileChange, round4, truncate_chars};

/// Weight of the reranker signal in the final score. Fixed design
/// constant, not learned per request.
pub const RERANK_WEIGHT: f32 = 0.6;

/// Weight of the retrieval signal in the final score.
pub const RETRIEVAL_WEIGHT: f32 = 0.4;

/// Characters of patch text included in the composite scoring text.
const PATCH_HEAD_CHARS: usize = 512;

/// Nearest neighbors consulted for the retrieval score.
const RETRIEVAL_K: usize = 3;

/// Additions + deletions above which a change counts as large.
const LARGE_CHANGE_LINES: u64 = 100;

const SECURITY_PATH_KEYWORDS: &[&str] = &["auth", "crypto", "token", "secret", "password"];
const SOURCE_ROOT_PREFIXES: &[&str] = &["src/", "lib/", "core/"];

/// One ranked file. Scores are rounded to 4 decimal digits; `rank` is
/// 1-based and dense within a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedFile {
    pub filename: String,
    pub rank: usize,
    pub reranker_score: f32,
    pub retrieval_score: f32,
    pub final_score: f32,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankResult {
    pub pr_id: String,
    pub ranked_files: Vec<RankedFile>,
    pub processing_ms: u64,
}

/// Combines [`Scorer`] output and [`HunkIndex`] retrieval into the final
/// per-file ordering with explanations.
pub struct RankingEngine {
    scorer: Arc<Scorer>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Option<Arc<HunkIndex>>,
}

impl RankingEngine {
    pub fn new(
        scorer: Arc<Scorer>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Option<Arc<HunkIndex>>,
    ) -> Self {
        Self {
            scorer,
            embedder,
            index,
        }
    }

    /// Ranks `files` by estimated importance. Infallible for well-formed
    /// input: internal failures degrade individual signals to defaults.
    pub async fn rank_pr(&self, pr_id: &str, repo: &str, files: &[FileChange]) -> RankResult {
        if files.is_empty() {
            return RankResult {
                pr_id: pr_id.to_string(),
                ranked_files: Vec::new(),
                processing_ms: 0,
            };
        }

        let started = Instant::now();

        let texts: Vec<String> = files.iter().map(score_text).collect();

        let reranker_scores = match self.scorer.score(&texts).await {
            Ok(scores) => scores,
            Err(e) => {
                warn!(pr_id, repo, error = %e, "Scorer failed, using neutral scores");
                vec![0.5; files.len()]
            }
        };

        let retrieval_scores = self.retrieval_scores(&texts).await;

        let mut ranked_files: Vec<RankedFile> = files
            .iter()
            .enumerate()
            .map(|(i, file)| {
                let rerank = reranker_scores[i];
                let retrieval = retrieval_scores[i];
                let final_score = RERANK_WEIGHT * rerank + RETRIEVAL_WEIGHT * retrieval;

                RankedFile {
                    filename: file.filename.clone(),
                    rank: 0,
                    reranker_score: round4(rerank),
                    retrieval_score: round4(retrieval),
                    final_score: round4(final_score),
                    explanation: explain(file),
                }
            })
            .collect();

        ranked_files.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(Ordering::Equal)
        });
        for (i, file) in ranked_files.iter_mut().enumerate() {
            file.rank = i + 1;
        }

        let processing_ms = started.elapsed().as_millis() as u64;
        debug!(pr_id, repo, files = files.len(), processing_ms, "PR ranked");

        RankResult {
            pr_id: pr_id.to_string(),
            ranked_files,
            processing_ms,
        }
    }

    /// Similarity of each file to its single best historical match among
    /// up to [`RETRIEVAL_K`] neighbors. 0.0 wherever retrieval is
    /// unavailable or fails.
    async fn retrieval_scores(&self, texts: &[String]) -> Vec<f32> {
        let Some(index) = &self.index else {
            return vec![0.0; texts.len()];
        };

        let embeddings = match self.embedder.embed(texts).await {
            Ok(embeddings) => embeddings,
            Err(e) => {
                warn!(error = %e, "Embedding failed, retrieval scores default to 0");
                return vec![0.0; texts.len()];
            }
        };

        embeddings
            .iter()
            .map(|embedding| match index.search(embedding, RETRIEVAL_K) {
                Ok(hits) => hits.first().map(|hit| hit.score).unwrap_or(0.0),
                Err(e) => {
                    warn!(error = %e, "Index search failed, retrieval score defaults to 0");
                    0.0
                }
            })
            .collect()
    }
}

/// Composite text scored for one file: filename plus the head of its patch.
pub(crate) fn score_text(file: &FileChange) -> String {
    let patch_head = truncate_chars(file.patch.as_deref().unwrap_or(""), PATCH_HEAD_CHARS);
    format!("<file>{}</file><diff>{}</diff>", file.filename, patch_head)
}

/// Rule-based explanation. Reason order is fixed: security path, large
/// change, core source.
fn explain(file: &FileChange) -> String {
    let mut reasons: Vec<&str> = Vec::new();

    if SECURITY_PATH_KEYWORDS
        .iter()
        .any(|kw| file.filename.contains(kw))
    {
        reasons.push("security-sensitive path");
    }
    if file.total_lines_changed() > LARGE_CHANGE_LINES {
        reasons.push("large change");
    }
    if SOURCE_ROOT_PREFIXES
        .iter()
        .any(|prefix| file.filename.starts_with(prefix))
    {
        reasons.push("core source");
    }

    if reasons.is_empty() {
        "standard change".to_string()
    } else {
        format!("{} → high priority", reasons.join(", "))
    }
}
