//! File-importance scoring.
//!
//! A closed set of two variants behind one interface, selected once at
//! initialization and never re-checked per call:
//!
//! - [`ModelScorer`] posts texts to an external sequence-scoring endpoint
//!   and squashes raw outputs through a sigmoid into `[0, 1]`.
//! - [`HeuristicScorer`] is the rule-based fallback and the system's
//!   availability guarantee when no model endpoint is configured or the
//!   endpoint fails its startup probe.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::{ScoringError, ScoringResult};

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::Config;

/// Field name under which [`Scorer::rank`] attaches scores.
pub const RERANKER_SCORE_KEY: &str = "reranker_score";

/// Character count above which the change-size bonus applies.
const LONG_TEXT_THRESHOLD: usize = 500;

static SECURITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)auth|crypto|secret|token|password|credential").expect("static regex")
});

static SOURCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<file>(src|lib|core|app)/").expect("static regex"));

static TEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)test|spec|__tests__").expect("static regex"));

/// Importance scorer: one score in `[0, 1]` per input text.
pub enum Scorer {
    Model(ModelScorer),
    Heuristic(HeuristicScorer),
}

impl Scorer {
    /// Selects the scorer variant once per process. The model-backed
    /// variant is chosen only when an inference endpoint is configured and
    /// answers a readiness probe; otherwise the heuristic fallback is
    /// latched for the process lifetime.
    pub async fn init(config: &Config, client: Client) -> Self {
        match &config.inference_url {
            Some(url) => {
                let model = ModelScorer::new(client, url);
                match model.probe().await {
                    Ok(()) => {
                        info!(endpoint = %url, "Using model-backed scorer");
                        Scorer::Model(model)
                    }
                    Err(e) => {
                        warn!(endpoint = %url, error = %e, "Inference endpoint unavailable, using heuristic scorer");
                        Scorer::Heuristic(HeuristicScorer)
                    }
                }
            }
            None => {
                info!("No inference endpoint configured, using heuristic scorer");
                Scorer::Heuristic(HeuristicScorer)
            }
        }
    }

    /// Scores each text with an importance estimate in `[0, 1]`. Output
    /// order matches input order; empty input yields empty output.
    pub async fn score(&self, texts: &[String]) -> ScoringResult<Vec<f32>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        match self {
            Scorer::Model(model) => model.score(texts).await,
            Scorer::Heuristic(heuristic) => Ok(heuristic.score(texts)),
        }
    }

    /// Scores `items` by the string field `text_key`, attaches the score
    /// under [`RERANKER_SCORE_KEY`], and returns the items sorted by score
    /// descending (stable on ties).
    pub async fn rank(&self, items: Vec<Value>, text_key: &str) -> ScoringResult<Vec<Value>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = items
            .iter()
            .map(|item| {
                item.get(text_key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();

        let scores = self.score(&texts).await?;

        let mut ranked: Vec<(Value, f32)> = items
            .into_iter()
            .zip(scores)
            .map(|(mut item, score)| {
                if let Some(obj) = item.as_object_mut() {
                    obj.insert(RERANKER_SCORE_KEY.to_string(), score.into());
                }
                (item, score)
            })
            .collect();

        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        Ok(ranked.into_iter().map(|(item, _)| item).collect())
    }

    pub fn is_model_backed(&self) -> bool {
        matches!(self, Scorer::Model(_))
    }
}

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    texts: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    scores: Vec<f32>,
}

/// Client for an external sequence-scoring endpoint.
pub struct ModelScorer {
    client: Client,
    score_url: String,
    probe_url: String,
}

impl ModelScorer {
    pub fn new(client: Client, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            client,
            score_url: format!("{base}/score"),
            probe_url: format!("{base}/health"),
        }
    }

    /// Readiness probe used once at scorer selection.
    async fn probe(&self) -> ScoringResult<()> {
        let response = self.client.get(&self.probe_url).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ScoringError::EndpointError {
                status: response.status().as_u16(),
                body: String::new(),
            })
        }
    }

    async fn score(&self, texts: &[String]) -> ScoringResult<Vec<f32>> {
        let response = self
            .client
            .post(&self.score_url)
            .json(&ScoreRequest { texts })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScoringError::EndpointError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ScoreResponse = response.json().await?;
        if parsed.scores.len() != texts.len() {
            return Err(ScoringError::CountMismatch {
                sent: texts.len(),
                received: parsed.scores.len(),
            });
        }

        // Raw sequence-classifier logits are squashed into [0, 1].
        Ok(parsed.scores.into_iter().map(sigmoid).collect())
    }
}

/// Rule-based fallback scorer. Deterministic and dependency-free.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer;

impl HeuristicScorer {
    pub fn score(&self, texts: &[String]) -> Vec<f32> {
        texts.iter().map(|t| self.score_one(t)).collect()
    }

    pub fn score_one(&self, text: &str) -> f32 {
        let mut score = 0.4f32;

        if SECURITY_RE.is_match(text) {
            score += 0.35;
        }
        if SOURCE_RE.is_match(text) {
            score += 0.15;
        }
        if TEST_RE.is_match(text) {
            score -= 0.15;
        }
        // Character count as a proxy for change size.
        if text.chars().count() > LONG_TEXT_THRESHOLD {
            score += 0.05;
        }

        score.clamp(0.0, 1.0)
    }
}

#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
