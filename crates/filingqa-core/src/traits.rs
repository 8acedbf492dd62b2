use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Answer, RetrievalResult};

/// Turns text into fixed-dimension vectors comparable with the stored chunk
/// embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `openai:text-embedding-ada-002`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| crate::Error::upstream("embedder returned no vector"))
    }
}

/// Nearest-neighbour search over stored chunks.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Number of chunks returned by [`Retriever::retrieve`].
    fn top_k(&self) -> usize;

    async fn retrieve_k(&self, query: &str, k: usize) -> Result<RetrievalResult>;

    async fn retrieve(&self, query: &str) -> Result<RetrievalResult> { self.retrieve_k(query, self.top_k()).await }
}

/// Single-turn text completion.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_id(&self) -> &str;
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Anything that can turn a question into an [`Answer`].
#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    async fn answer(&self, question: &str) -> Result<Answer>;
}
