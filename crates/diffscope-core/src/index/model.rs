//! Index entry metadata and search results.

use serde::{Deserialize, Serialize};

use crate::types::truncate_chars;

/// Opaque metadata attached to one indexed hunk vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HunkMeta {
    pub filename: String,

    /// Offline importance label assigned when the index was built.
    #[serde(default)]
    pub importance: f32,

    /// First lines of the hunk, for display.
    #[serde(default)]
    pub hunk_preview: String,

    #[serde(default)]
    pub pr_id: u64,

    #[serde(default)]
    pub repo: String,
}

/// One nearest-neighbor match returned by a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub score: f32,
    pub filename: String,
    pub importance: f32,
    pub hunk_preview: String,
    pub pr_id: u64,
    pub repo: String,
}

impl RetrievalHit {
    pub(crate) fn from_meta(score: f32, meta: &HunkMeta) -> Self {
        Self {
            score,
            filename: meta.filename.clone(),
            importance: meta.importance,
            hunk_preview: truncate_chars(&meta.hunk_preview, 200).to_string(),
            pr_id: meta.pr_id,
            repo: meta.repo.clone(),
        }
    }
}
