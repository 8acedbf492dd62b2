//! OpenAI chat-completions client used as the answer generator.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use filingqa_core::config::OpenAiSettings;
use filingqa_core::traits::LanguageModel;
use filingqa_core::{Error, Result};
use filingqa_core::http::{api_error, build_client};

pub struct OpenAiChatModel {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiChatModel {
    /// No request is sent here; a bad key surfaces on the first completion.
    pub fn new(settings: &OpenAiSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(settings.timeout)?,
            api_key: SecretString::new(settings.api_key.expose_secret().clone()),
            base_url: settings.base_url.clone(),
            model: settings.chat_model.clone(),
            temperature: settings.temperature,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    fn model_id(&self) -> &str { &self.model }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [ChatMessage { role: "user", content: prompt }],
        };
        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::upstream(format!("chat completion request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(api_error("chat completions", status, &body));
        }
        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| Error::upstream(format!("malformed chat completion response: {e}")))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::upstream("chat completion returned no content"))?;
        debug!(
            model = %self.model,
            prompt_chars = prompt.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "chat completion"
        );
        Ok(content)
    }
}
