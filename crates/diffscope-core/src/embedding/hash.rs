//! Deterministic offline embedder.
//!
//! Feature-hashes tokens into a fixed number of buckets with blake3 and
//! L2-normalizes the result. Not semantically meaningful, but stable across
//! processes, which keeps ranking, clustering, and retrieval operational
//! when no embedding endpoint is configured.

use async_trait::async_trait;

use super::error::EmbeddingResult;
use super::{EmbeddingProvider, l2_normalize};

#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = blake3::hash(token.to_lowercase().as_bytes());
            let bytes = digest.as_bytes();

            let bucket = u64::from_le_bytes(bytes[0..8].try_into().unwrap_or_default());
            let sign_byte = bytes[8];

            let idx = (bucket % self.dim as u64) as usize;
            // Signed buckets keep the expected dot product of unrelated
            // texts near zero.
            let sign = if sign_byte & 1 == 0 { 1.0 } else { -1.0 };
            vector[idx] += sign;
        }

        l2_normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dim(&self) -> usize {
        self.dim
    }
}
