//! Turns a blog detail URL into a first-person post.
//!
//! The conversation sent to the model is always a single user turn whose
//! content is the URL itself; all style rules live in the system prompt.

use std::fmt;
use std::sync::Arc;
use bp_core::{ChatMessage, Error, LanguageModel, Result};

/// First-person reflection, 80-120 words, no emojis, ending in a question and a `Source:` line.
pub const LINKEDIN_POST_PROMPT: &str = include_str!("../prompts/linkedin_post_v1.md");

pub struct PostGenerator {
    model: Arc<dyn LanguageModel>,
    system_prompt: String,
}

impl fmt::Debug for PostGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostGenerator")
            .field("model", &self.model.name())
            .field("system_prompt_len", &self.system_prompt.len())
            .finish()
    }
}

impl PostGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            system_prompt: LINKEDIN_POST_PROMPT.trim().to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Every failure comes back as `Error::Generation`.
    pub async fn generate(&self, detail_url: &str) -> Result<String> {
        let messages = [ChatMessage::user(detail_url)];

        let text = self
            .model
            .generate(&self.system_prompt, &messages)
            .await
            .map_err(|e| match e {
                Error::Generation(_) => e,
                other => Error::Generation(other.to_string()),
            })?;

        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Generation(format!(
                "{} returned an empty post for {}",
                self.model.name(),
                detail_url
            )));
        }

        tracing::debug!("Generated {} words for {}", text.split_whitespace().count(), detail_url);
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingModel {
        reply: String,
        calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        fn name(&self) -> &str {
            "recording"
        }

        async fn generate(&self, system_prompt: &str, messages: &[ChatMessage]) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), messages.to_vec()));
            Ok(self.reply.clone())
        }
    }

    #[derive(Debug)]
    struct BrokenModel;

    #[async_trait]
    impl LanguageModel for BrokenModel {
        fn name(&self) -> &str {
            "broken"
        }

        async fn generate(&self, _system_prompt: &str, _messages: &[ChatMessage]) -> Result<String> {
            Err(Error::Config("missing key".to_string()))
        }
    }

    #[tokio::test]
    async fn test_single_user_turn_with_url() {
        let model = Arc::new(RecordingModel {
            reply: "  I read something good.\nSource: https://example.com/a \n".to_string(),
            ..Default::default()
        });
        let generator = PostGenerator::new(model.clone());

        let text = generator.generate("https://example.com/a").await.unwrap();
        assert_eq!(text, "I read something good.\nSource: https://example.com/a");

        let calls = model.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (prompt, messages) = &calls[0];
        assert_eq!(prompt, generator.system_prompt());
        assert_eq!(messages, &vec![ChatMessage::user("https://example.com/a")]);
    }

    #[test]
    fn test_default_prompt_constraints() {
        assert!(LINKEDIN_POST_PROMPT.contains("80-120 words"));
        assert!(LINKEDIN_POST_PROMPT.contains("No emojis"));
        assert!(LINKEDIN_POST_PROMPT.contains("Source: URL"));
    }

    #[tokio::test]
    async fn test_custom_prompt() {
        let model = Arc::new(RecordingModel {
            reply: "ok".to_string(),
            ..Default::default()
        });
        let generator = PostGenerator::new(model.clone()).with_system_prompt("summarize fully");
        generator.generate("https://example.com/a").await.unwrap();
        assert_eq!(model.calls.lock().unwrap()[0].0, "summarize fully");
    }

    #[tokio::test]
    async fn test_empty_reply_is_generation_error() {
        let model = Arc::new(RecordingModel {
            reply: "   \n".to_string(),
            ..Default::default()
        });
        let result = PostGenerator::new(model).generate("https://example.com/a").await;
        assert!(matches!(result, Err(Error::Generation(_))));
    }

    #[tokio::test]
    async fn test_other_errors_become_generation_errors() {
        let result = PostGenerator::new(Arc::new(BrokenModel))
            .generate("https://example.com/a")
            .await;
        match result {
            Err(Error::Generation(message)) => assert!(message.contains("missing key")),
            other => panic!("expected generation error, got {:?}", other),
        }
    }
}
