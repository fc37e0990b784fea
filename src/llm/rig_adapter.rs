//! Bridges a rig-core `CompletionModel` to [`GenerativeModel`].

use async_trait::async_trait;
use rig::completion::CompletionModel;
use rig::message::AssistantContent;

use super::{GenerativeModel, LlmConfig};
use crate::error::LlmError;

/// Wraps a rig completion model; one prompt per call, no chat history.
pub struct RigAdapter<M: CompletionModel> {
    model: M,
    provider: &'static str,
    model_name: String,
    temperature: f64,
    max_tokens: u64,
}

impl<M: CompletionModel> RigAdapter<M> {
    /// Sampling parameters from `config` are applied to every request.
    pub fn new(model: M, provider: &'static str, config: &LlmConfig) -> Self {
        Self {
            model,
            provider,
            model_name: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl<M> GenerativeModel for RigAdapter<M>
where
    M: CompletionModel + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        tracing::debug!(
            provider = self.provider,
            model = %self.model_name,
            prompt_chars = prompt.len(),
            "Sending prompt"
        );
        let response = self
            .model
            .completion_request(prompt)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: self.provider.to_string(),
                reason: e.to_string(),
            })?;

        let text: String = response
            .choice
            .iter()
            .filter_map(|content| match content {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect();

        if text.trim().is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.provider.to_string(),
                reason: "no text content".into(),
            });
        }
        Ok(text)
    }
}
