//! Chat-completion language model used to phrase answers and summaries.

use crate::config::LlmSettings;
use crate::error::{CallpilotError, Result};
use crate::openai::create_compatible_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A model that turns a system and user prompt into a reply.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete one system/user exchange. The reply is returned trimmed.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Model identifier, for logs.
    fn model(&self) -> &str;
}

/// OpenAI-compatible chat model (Groq by default).
pub struct ChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl ChatModel {
    pub fn new(base_url: &str, api_key: &str, model: &str, temperature: f32) -> Self {
        Self {
            client: create_compatible_client(base_url, api_key),
            model: model.to_string(),
            temperature,
        }
    }

    /// Build a model from settings, or `None` when no API key is available.
    pub fn from_settings(settings: &LlmSettings) -> Option<Arc<dyn LanguageModel>> {
        let api_key = settings.api_key()?;
        Some(Arc::new(Self::new(
            &settings.base_url,
            &api_key,
            &settings.model,
            settings.temperature,
        )))
    }
}

#[async_trait]
impl LanguageModel for ChatModel {
    #[instrument(skip(self, system, user), fields(model = %self.model))]
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system.to_string())
                .build()
                .map_err(|e| CallpilotError::Llm(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user.to_string())
                .build()
                .map_err(|e| CallpilotError::Llm(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| CallpilotError::Llm(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            CallpilotError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or_default()
            .trim()
            .to_string();

        debug!("Model replied with {} chars", answer.len());
        Ok(answer)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings_requires_key() {
        let settings = LlmSettings {
            api_key_env: "CALLPILOT_TEST_UNSET_KEY".to_string(),
            ..LlmSettings::default()
        };
        assert!(ChatModel::from_settings(&settings).is_none());
    }

    #[test]
    fn test_chat_model_keeps_model_name() {
        let model = ChatModel::new("http://localhost:1/v1", "test-key", "llama3-8b-8192", 0.2);
        assert_eq!(model.model(), "llama3-8b-8192");
    }
}
