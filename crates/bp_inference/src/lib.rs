use bp_core::{Error, Result};
use std::fmt;
use std::str::FromStr;

pub mod generator;
pub mod models;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Gemini,
    OpenAi,
    Ollama,
    Dummy,
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            "dummy" => Ok(Self::Dummy),
            other => Err(Error::Config(format!(
                "Unknown model provider '{}'. Available: gemini, openai, ollama, dummy",
                other
            ))),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::Dummy => "dummy",
        };
        f.write_str(name)
    }
}

/// Which provider to talk to and how. Unset fields fall back to the provider defaults.
#[derive(Clone, Default)]
pub struct ModelConfig {
    pub provider: Provider,
    pub model_name: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("model_name", &self.model_name)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

pub mod prelude {
    pub use super::generator::PostGenerator;
    pub use super::models::create_model;
    pub use super::{ModelConfig, Provider};
    pub use bp_core::{ChatMessage, Error, LanguageModel, Result};
}

pub use generator::PostGenerator;
pub use models::create_model;
