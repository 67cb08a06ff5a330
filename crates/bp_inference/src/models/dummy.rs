use std::fmt;
use bp_core::{ChatMessage, Error, LanguageModel, Result, Role};

/// Offline model that writes a fixed-shape post around the last user message.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LanguageModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate(&self, _system_prompt: &str, messages: &[ChatMessage]) -> Result<String> {
        let url = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.trim())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::Generation("No user message to respond to".to_string()))?;

        Ok(format!(
            "I spent some time today with a piece on a topic I keep coming back to. \
             What stayed with me was how small changes in habits compound over a project. \
             Has this matched your experience?\n\nSource: {}",
            url
        ))
    }
}
