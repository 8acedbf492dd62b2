//! One fully wired question-answering session per configuration.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use filingqa_core::config::{AppConfig, RetrievalSettings};
use filingqa_core::session::SessionCache;
use filingqa_core::traits::QuestionAnswerer;
use filingqa_core::types::Answer;
use filingqa_core::Result;
use filingqa_embed::get_default_embedder;
use filingqa_vector::Neo4jVectorStore;

use crate::chain::AnswerChain;
use crate::llm::OpenAiChatModel;

/// Identifies the backends a session talks to. Secrets stay out of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub neo4j_uri: String,
    pub neo4j_username: String,
    pub neo4j_database: String,
    pub retrieval: RetrievalSettings,
    pub openai_base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
    temperature_bits: u32,
}

impl SessionKey {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            neo4j_uri: config.neo4j.uri.clone(),
            neo4j_username: config.neo4j.username.clone(),
            neo4j_database: config.neo4j.database.clone(),
            retrieval: config.retrieval.clone(),
            openai_base_url: config.openai.base_url.clone(),
            chat_model: config.openai.chat_model.clone(),
            embedding_model: config.openai.embedding_model.clone(),
            embedding_dim: config.openai.embedding_dim,
            temperature_bits: config.openai.temperature.to_bits(),
        }
    }
}

pub type SessionCacheMap = SessionCache<SessionKey, SessionHandle>;

pub struct SessionHandle {
    pub store: Arc<Neo4jVectorStore>,
    pub chain: AnswerChain,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle").field("store", &self.store).field("model", &self.chain.model_id()).finish()
    }
}

impl SessionHandle {
    /// Connect, bind to the index and wire the chain. Every step that can fail
    /// does so here, before the first question.
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let embedder = get_default_embedder(&config.openai)?;
        let store = Arc::new(Neo4jVectorStore::initialize(&config.neo4j, embedder, config.retrieval.clone()).await?);
        let llm = Arc::new(OpenAiChatModel::new(&config.openai)?);
        let chain = AnswerChain::build(store.clone(), llm);
        info!(model = chain.model_id(), index = %store.index_info().name, "session ready");
        Ok(Self { store, chain })
    }

    /// The session for `config`, built on first use and shared afterwards.
    pub async fn open(cache: &SessionCacheMap, config: &AppConfig) -> Result<Arc<Self>> {
        cache.get_or_try_init(&SessionKey::from_config(config), || Self::connect(config)).await
    }
}

#[async_trait]
impl QuestionAnswerer for SessionHandle {
    async fn answer(&self, question: &str) -> Result<Answer> { self.chain.answer(question).await }
}
