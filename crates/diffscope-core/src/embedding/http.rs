//! HTTP embedding provider.
//!
//! Posts batches to an OpenAI-style `/embeddings` endpoint and
//! L2-normalizes the returned vectors.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{EmbeddingError, EmbeddingResult};
use super::{EmbeddingProvider, l2_normalize};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: String,
    dim: usize,
}

impl HttpEmbeddingProvider {
    pub fn new(client: Client, base_url: &str, dim: usize) -> Self {
        let endpoint = format!("{}/embeddings", base_url.trim_end_matches('/'));
        Self {
            client,
            endpoint,
            dim,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = texts.len(), endpoint = %self.endpoint, "Requesting embeddings");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbeddingRequest { input: texts })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::EndpointError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = response.json().await?;

        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                sent: texts.len(),
                received: parsed.data.len(),
            });
        }

        let mut vectors = Vec::with_capacity(parsed.data.len());
        for data in parsed.data {
            if data.embedding.len() != self.dim {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dim,
                    actual: data.embedding.len(),
                });
            }
            let mut vector = data.embedding;
            l2_normalize(&mut vector);
            vectors.push(vector);
        }

        Ok(vectors)
    }

    fn dim(&self) -> usize {
        self.dim
    }
}
