//! Answer generation backends.

use crate::config::GenerationSettings;
use crate::error::{LeseError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Trait for answer generation.
///
/// Failures must come back as [`LeseError::Generation`] so callers can tell
/// a backend outage apart from "not in the document".
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Produce a completion for a system instruction and user prompt.
    async fn generate(&self, system: &str, user: &str, max_tokens: u32) -> Result<String>;
}

/// Chat-completions generator for OpenAI-compatible APIs.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIGenerator {
    /// Create a generator for the configured model, endpoint and timeout.
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(&settings.endpoint(), settings.timeout())?,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    /// Override the model.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl AnswerGenerator for OpenAIGenerator {
    #[instrument(skip(self, system, user), fields(model = %self.model))]
    #[allow(deprecated)]
    async fn generate(&self, system: &str, user: &str, max_tokens: u32) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| LeseError::Generation(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| LeseError::Generation(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(max_tokens)
            .build()
            .map_err(|e| LeseError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LeseError::Generation(format!("Chat completion failed: {}", e)))?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| LeseError::Generation("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }
}

/// Create the generator selected by the settings.
pub fn create_generator(settings: &GenerationSettings) -> Result<Arc<dyn AnswerGenerator>> {
    Ok(Arc::new(OpenAIGenerator::from_settings(settings)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_creation() {
        let settings = GenerationSettings {
            api_base: Some("http://localhost:9/v1".to_string()),
            api_key_env: String::new(),
            ..Default::default()
        };
        let generator = OpenAIGenerator::from_settings(&settings)
            .unwrap()
            .with_model("mistral-large-latest");
        assert_eq!(generator.model(), "mistral-large-latest");
    }
}
