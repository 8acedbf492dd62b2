//! OpenAI embeddings provider using the `/v1/embeddings` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use filingqa_core::config::OpenAiSettings;
use filingqa_core::http::{api_error, build_client};
use filingqa_core::traits::Embedder;
use filingqa_core::{Error, Result};

pub struct OpenAiEmbedder {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    dim: usize,
    id: String,
}

impl OpenAiEmbedder {
    pub fn new(settings: &OpenAiSettings) -> Result<Self> {
        let client = build_client(settings.timeout)?;
        Ok(Self {
            client,
            api_key: SecretString::new(settings.api_key.expose_secret().clone()),
            base_url: settings.base_url.clone(),
            model: settings.embedding_model.clone(),
            dim: settings.embedding_dim,
            id: format!("openai:{}:d{}", settings.embedding_model, settings.embedding_dim),
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn embedder_id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let resp = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&EmbeddingRequest { model: &self.model, input: texts })
            .send()
            .await
            .map_err(|e| Error::upstream(format!("embeddings request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(api_error("embeddings", status, &body));
        }
        let mut parsed: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| Error::upstream(format!("malformed embeddings response: {e}")))?;

        if parsed.data.len() != texts.len() {
            return Err(Error::upstream(format!(
                "embedder returned {} vectors for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }
        parsed.data.sort_by_key(|d| d.index);
        let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();
        if let Some(v) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(Error::upstream(format!("dim mismatch: got {} expected {}", v.len(), self.dim)));
        }
        debug!(model = %self.model, inputs = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(vectors)
    }
}
