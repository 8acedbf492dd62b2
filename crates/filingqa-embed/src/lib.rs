//! filingqa-embed
//!
//! Embedding providers behind `filingqa_core::traits::Embedder`: the OpenAI
//! `/v1/embeddings` client used in production and a deterministic hash
//! embedder for tests and offline runs.

pub mod hash;
pub mod openai;

use std::sync::Arc;

use filingqa_core::config::OpenAiSettings;
use filingqa_core::traits::Embedder;
use filingqa_core::Result;

pub use hash::HashEmbedder;
pub use openai::OpenAiEmbedder;

/// OpenAI unless `APP_USE_FAKE_EMBEDDINGS` is `1`/`true`, in which case the
/// hash embedder is used with the configured dimension.
pub fn get_default_embedder(settings: &OpenAiSettings) -> Result<Arc<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    if use_fake {
        tracing::info!(dim = settings.embedding_dim, "using HashEmbedder");
        return Ok(Arc::new(HashEmbedder::new(settings.embedding_dim)));
    }
    Ok(Arc::new(OpenAiEmbedder::new(settings)?))
}
