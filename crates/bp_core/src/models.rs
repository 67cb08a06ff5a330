use std::fmt;
use async_trait::async_trait;
use crate::types::ChatMessage;
use crate::Result;

#[async_trait]
pub trait LanguageModel: Send + Sync + fmt::Debug {
    /// Provider name, for logs
    fn name(&self) -> &str;

    /// Run one chat completion and return the text of the reply
    async fn generate(&self, system_prompt: &str, messages: &[ChatMessage]) -> Result<String>;
}
