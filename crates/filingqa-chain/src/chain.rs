use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use filingqa_core::traits::{LanguageModel, QuestionAnswerer, Retriever};
use filingqa_core::types::{is_blank_question, Answer};
use filingqa_core::Result;

use crate::prompt::{build_prompt, parse_completion};

/// Retrieve, stuff every chunk into one prompt, ask the model once.
pub struct AnswerChain {
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn LanguageModel>,
}

impl AnswerChain {
    pub fn build(retriever: Arc<dyn Retriever>, llm: Arc<dyn LanguageModel>) -> Self { Self { retriever, llm } }

    pub fn model_id(&self) -> &str { self.llm.model_id() }
}

#[async_trait]
impl QuestionAnswerer for AnswerChain {
    /// Blank questions yield an empty answer without touching either backend.
    async fn answer(&self, question: &str) -> Result<Answer> {
        if is_blank_question(question) {
            return Ok(Answer::default());
        }
        let retrieved = self.retriever.retrieve(question).await?;
        let prompt = build_prompt(question, retrieved.chunks());
        let completion = self.llm.complete(&prompt).await?;

        let (text, cited) = parse_completion(&completion);
        let (sources, dropped): (Vec<_>, Vec<_>) = cited.into_iter().partition(|id| retrieved.contains_id(id));
        if !dropped.is_empty() {
            warn!(?dropped, "model cited sources that were not retrieved");
        }
        debug!(k = retrieved.top_k(), chunks = retrieved.len(), sources = sources.len(), "answered");
        Ok(Answer::new(text, sources))
    }
}
