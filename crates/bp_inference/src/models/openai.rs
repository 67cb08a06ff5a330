use std::fmt;
use async_trait::async_trait;
use bp_core::{ChatMessage, Error, LanguageModel, Result, Role};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use crate::ModelConfig;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// Any server speaking the OpenAI chat-completions protocol.
pub struct OpenAiModel {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiModel {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Ok(Self {
            client: super::http_client()?,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            model: config.model_name.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn generate(&self, system_prompt: &str, messages: &[ChatMessage]) -> Result<String> {
        let mut request_messages = Vec::with_capacity(messages.len() + 1);
        request_messages.push(RequestMessage {
            role: "system",
            content: system_prompt,
        });
        request_messages.extend(messages.iter().map(|m| RequestMessage {
            role: match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: &m.content,
        }));

        let request = ChatRequest {
            model: &self.model,
            messages: request_messages,
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Generation(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(super::provider_error("OpenAI", response).await);
        }

        let response = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| Error::Generation(format!("Malformed OpenAI response: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Generation("OpenAI returned no choices".to_string()))
    }
}
