use std::fmt;
use std::sync::Arc;
use bp_core::{ChatMessage, Error, LanguageModel, Result, Role};
use langchain_rust::language_models::llm::LLM;
use langchain_rust::llm::ollama::client::{Ollama, OllamaClient};
use langchain_rust::schema::Message;
use crate::ModelConfig;

const DEFAULT_HOST: &str = "http://localhost";
const DEFAULT_PORT: u16 = 11434;
const DEFAULT_MODEL: &str = "llama3";

pub struct OllamaModel {
    ollama: Ollama,
    model: String,
}

impl OllamaModel {
    /// `base_url` is `scheme://host[:port]`; the port defaults to 11434.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let (host, port) = match config.base_url.as_deref() {
            Some(raw) => {
                let parsed = reqwest::Url::parse(raw)
                    .map_err(|e| Error::InvalidUrl(format!("{}: {}", raw, e)))?;
                let host = format!(
                    "{}://{}",
                    parsed.scheme(),
                    parsed.host_str().unwrap_or("localhost")
                );
                (host, parsed.port().unwrap_or(DEFAULT_PORT))
            }
            None => (DEFAULT_HOST.to_string(), DEFAULT_PORT),
        };

        let model = config
            .model_name
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let client = Arc::new(OllamaClient::new(host, port));

        Ok(Self {
            ollama: Ollama::new(client, model.clone(), None),
            model,
        })
    }
}

impl fmt::Debug for OllamaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaModel")
            .field("ollama_client", &"<Ollama>")
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait::async_trait]
impl LanguageModel for OllamaModel {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn generate(&self, system_prompt: &str, messages: &[ChatMessage]) -> Result<String> {
        let mut conversation = vec![Message::new_system_message(system_prompt)];
        conversation.extend(messages.iter().map(|m| match m.role {
            Role::User => Message::new_human_message(&m.content),
            Role::Assistant => Message::new_ai_message(&m.content),
        }));

        let result = self
            .ollama
            .generate(&conversation)
            .await
            .map_err(|e| Error::Generation(format!("Ollama generation failed: {}", e)))?;

        Ok(result.generation)
    }
}
