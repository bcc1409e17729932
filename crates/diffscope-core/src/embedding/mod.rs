//! Embedding capability.
//!
//! - [`http`] talks to an external embedding endpoint.
//! - [`hash`] is the deterministic offline fallback.
//!
//! The provider is selected once at startup from [`crate::config::Config`]
//! and shared read-only for the process lifetime.

mod error;
/// Deterministic feature-hashing embedder (offline fallback).
pub mod hash;
/// Remote embedding endpoint client.
pub mod http;


pub use error::{EmbeddingError, EmbeddingResult};
pub use hash::HashEmbedder;
pub use http::HttpEmbeddingProvider;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::Config;

/// Produces one fixed-dimension, L2-normalized vector per input text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a batch of texts. Output order matches input order; empty
    /// input yields empty output.
    async fn embed(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// The fixed dimension D of produced vectors.
    fn dim(&self) -> usize;
}

/// Selects the embedding provider from configuration. Called once per process.
pub fn provider_from_config(
    config: &Config,
    client: reqwest::Client,
) -> Arc<dyn EmbeddingProvider> {
    match &config.embedding_url {
        Some(url) => {
            info!(endpoint = %url, dim = config.embedding_dim, "Using HTTP embedding provider");
            Arc::new(HttpEmbeddingProvider::new(
                client,
                url,
                config.embedding_dim,
            ))
        }
        None => {
            info!(
                dim = config.embedding_dim,
                "No embedding endpoint configured, using deterministic hash embedder"
            );
            Arc::new(HashEmbedder::new(config.embedding_dim))
        }
    }
}

/// Scales `vector` to unit L2 norm in place. Zero vectors are left unchanged.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 1e-9 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Dot product of two equal-length vectors (cosine similarity for
/// L2-normalized inputs). Returns 0.0 on length mismatch or empty input.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine similarity of two vectors of any magnitude.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a_sq, norm_b_sq) =
        a.iter()
            .zip(b.iter())
            .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (av, bv)| {
                (dot + av * bv, na + av * av, nb + bv * bv)
            });

    let norm_a = norm_a_sq.sqrt();
    let norm_b = norm_b_sq.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
