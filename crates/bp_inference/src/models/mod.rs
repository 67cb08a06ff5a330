use std::sync::Arc;
use std::time::Duration;
use bp_core::{Error, LanguageModel, Result};
use reqwest::Client;
use crate::{ModelConfig, Provider};

pub mod dummy;
pub mod gemini;
pub mod openai;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use dummy::DummyModel;
pub use gemini::GeminiModel;
pub use openai::OpenAiModel;

#[cfg(feature = "ollama")]
pub use ollama::OllamaModel;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client shared by the provider adapters. Requests have no overall
/// timeout; generation can legitimately take a while.
pub(crate) fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("bp/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Read a non-success provider response into a `Generation` error.
pub(crate) async fn provider_error(provider: &str, response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);
    Error::Generation(format!("{} returned {}: {}", provider, status, detail.trim()))
}

pub async fn create_model(config: &ModelConfig) -> Result<Arc<dyn LanguageModel>> {
    let model: Arc<dyn LanguageModel> = match config.provider {
        Provider::Gemini => Arc::new(GeminiModel::new(config)?),
        Provider::OpenAi => Arc::new(OpenAiModel::new(config)?),
        Provider::Dummy => Arc::new(DummyModel::new()),
        #[cfg(feature = "ollama")]
        Provider::Ollama => Arc::new(OllamaModel::new(config)?),
        #[cfg(not(feature = "ollama"))]
        Provider::Ollama => {
            return Err(Error::Config(
                "Ollama support was not compiled in (enable the `ollama` feature)".to_string(),
            ))
        }
    };
    tracing::debug!("Created {} model", model.name());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_dummy_model() {
        let config = ModelConfig {
            provider: Provider::Dummy,
            ..Default::default()
        };
        let model = create_model(&config).await.unwrap();
        assert_eq!(model.name(), "Dummy");
    }

    #[tokio::test]
    async fn test_gemini_requires_api_key() {
        let config = ModelConfig::default();
        let result = create_model(&config).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
