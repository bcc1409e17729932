//! Diffscope library crate (used by the server and integration tests).
//!
//! The PR intelligence pipeline: rank changed files by estimated
//! importance, group them into semantic clusters, and retrieve
//! historically similar change fragments.
//!
//! - [`ranking`] blends scorer and retrieval signals into one ordering.
//! - [`scoring`] holds the model-backed scorer and its heuristic fallback.
//! - [`index`] is the nearest-neighbor index over historical hunks.
//! - [`clustering`] groups embedded files with noise handling.
//! - [`queue`] decouples webhook ingestion from pipeline execution.
//! - [`pipeline`] wires the above behind one lazily-initialized service.

pub mod clustering;
pub mod config;
pub mod embedding;
pub mod github;
pub mod index;
pub mod pipeline;
pub mod queue;
pub mod ranking;
pub mod scoring;
pub mod types;

pub use clustering::{ClusterGroup, ClusterItem, SemanticClusterer};
pub use config::{Config, ConfigError, DEFAULT_EMBEDDING_DIM, DEFAULT_QUEUE_CAPACITY};
pub use embedding::{
    EmbeddingError, EmbeddingProvider, HashEmbedder, HttpEmbeddingProvider, cosine_similarity,
    l2_normalize, provider_from_config,
};
pub use github::{GithubClient, GithubError};
pub use index::{HunkIndex, HunkMeta, IndexError, META_SUFFIX, RetrievalHit};
pub use pipeline::{
    ClusterResult, DEFAULT_RETRIEVE_K, PipelineHandler, PipelineService, RETRIEVAL_UNAVAILABLE,
    RetrieveResult,
};
pub use queue::{TaskHandler, TaskQueue};
pub use ranking::{RERANK_WEIGHT, RETRIEVAL_WEIGHT, RankResult, RankedFile, RankingEngine};
pub use scoring::{HeuristicScorer, ModelScorer, RERANKER_SCORE_KEY, Scorer, ScoringError};
pub use types::{FileChange, Task, TaskAction};
