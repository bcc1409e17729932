//! Shared pipeline types.

use serde::{Deserialize, Serialize};

/// A single changed file within a pull request, as received from the
/// gateway or the repository-hosting API. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    pub filename: String,

    /// Unified-diff text for the change, when the hosting API provides one
    /// (binary files and very large diffs come through without a patch).
    #[serde(default)]
    pub patch: Option<String>,

    #[serde(default)]
    pub additions: u64,

    #[serde(default)]
    pub deletions: u64,
}

impl FileChange {
    pub fn total_lines_changed(&self) -> u64 {
        self.additions + self.deletions
    }
}

/// Action carried by a queued [`Task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskAction {
    RankPr,
}

/// Unit of background work produced by the webhook gateway and consumed
/// exactly once by the queue worker. Not persisted across restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub action: TaskAction,
    pub pr_id: u64,
    pub repo: String,
    pub files: Vec<FileChange>,
}

impl Task {
    pub fn rank_pr(pr_id: u64, repo: impl Into<String>) -> Self {
        Self {
            action: TaskAction::RankPr,
            pr_id,
            repo: repo.into(),
            files: Vec::new(),
        }
    }
}

/// Truncates to at most `max_chars` characters, respecting UTF-8 boundaries.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Rounds to 4 decimal digits, the fixed precision of all returned scores.
pub(crate) fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}
