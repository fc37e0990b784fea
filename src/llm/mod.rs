//! Model integrations.
//!
//! - **Generative**: hosted LLMs via rig-core (Gemini, Anthropic, OpenAI),
//!   bridged to our [`GenerativeModel`] trait by `RigAdapter`.
//! - **Sentiment**: a Hugging Face text-classification endpoint behind
//!   [`SentimentModel`](sentiment::SentimentModel).

mod rig_adapter;
pub mod sentiment;

pub use rig_adapter::RigAdapter;

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::error::{ConfigError, LlmError};

/// A hosted generative model: prompt in, raw text out.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Send a single prompt and return the model's text reply.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Gemini,
    Anthropic,
    OpenAi,
}

impl LlmBackend {
    /// Environment variable holding this backend's API key.
    pub fn api_key_var(self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.5-flash",
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::OpenAi => "gpt-4o",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }
}

impl FromStr for LlmBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            other => Err(ConfigError::InvalidValue {
                key: "EMAIL_LLM_BACKEND".into(),
                message: format!("unknown backend '{other}'"),
            }),
        }
    }
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    /// Read at startup; a missing key is reported when the provider is built.
    pub api_key: Option<secrecy::SecretString>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u64,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn GenerativeModel>, LlmError> {
    let Some(api_key) = config.api_key.as_ref() else {
        return Err(ConfigError::MissingEnvVar(config.backend.api_key_var().to_string()).into());
    };

    match config.backend {
        LlmBackend::Gemini => create_gemini_provider(config, api_key.expose_secret()),
        LlmBackend::Anthropic => create_anthropic_provider(config, api_key.expose_secret()),
        LlmBackend::OpenAi => create_openai_provider(config, api_key.expose_secret()),
    }
}

fn client_error(provider: &str, e: impl std::fmt::Display) -> LlmError {
    LlmError::RequestFailed {
        provider: provider.to_string(),
        reason: format!("Failed to create client: {e}"),
    }
}

fn create_gemini_provider(
    config: &LlmConfig,
    api_key: &str,
) -> Result<Arc<dyn GenerativeModel>, LlmError> {
    use rig::providers::gemini;

    let client = gemini::Client::new(api_key).map_err(|e| client_error("gemini", e))?;
    let model = client.completion_model(&config.model);
    tracing::info!("Using Gemini (model: {})", config.model);
    Ok(Arc::new(RigAdapter::new(model, "gemini", config)))
}

fn create_anthropic_provider(
    config: &LlmConfig,
    api_key: &str,
) -> Result<Arc<dyn GenerativeModel>, LlmError> {
    use rig::providers::anthropic;

    let client: rig::client::Client<anthropic::client::AnthropicExt> =
        anthropic::Client::new(api_key).map_err(|e| client_error("anthropic", e))?;
    let model = client.completion_model(&config.model);
    tracing::info!("Using Anthropic (model: {})", config.model);
    Ok(Arc::new(RigAdapter::new(model, "anthropic", config)))
}

fn create_openai_provider(
    config: &LlmConfig,
    api_key: &str,
) -> Result<Arc<dyn GenerativeModel>, LlmError> {
    use rig::providers::openai;

    let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
        openai::Client::new(api_key).map_err(|e| client_error("openai", e))?;
    let model = client.completion_model(&config.model);
    tracing::info!("Using OpenAI (model: {})", config.model);
    Ok(Arc::new(RigAdapter::new(model, "openai", config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(backend: LlmBackend, key: Option<&str>) -> LlmConfig {
        LlmConfig {
            backend,
            api_key: key.map(secrecy::SecretString::from),
            model: backend.default_model().to_string(),
            temperature: 0.2,
            max_tokens: 512,
        }
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let err = create_provider(&config(LlmBackend::Gemini, None))
            .err()
            .expect("provider without key must fail");
        match err {
            LlmError::Config(ConfigError::MissingEnvVar(var)) => assert_eq!(var, "GEMINI_API_KEY"),
            other => panic!("Expected MissingEnvVar, got {:?}", other),
        }
    }

    #[test]
    fn gemini_provider_builds_without_runtime() {
        // Plain #[test]: no Tokio reactor is running here.
        let provider = create_provider(&config(LlmBackend::Gemini, Some("k"))).unwrap();
        assert_eq!(provider.model_name(), "gemini-2.5-flash");
    }

    #[test]
    fn test_create_anthropic_provider() {
        // Clients accept any string as key; auth fails on first request.
        let provider = create_provider(&config(LlmBackend::Anthropic, Some("test-key")));
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().model_name(), "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_create_openai_provider() {
        let provider = create_provider(&config(LlmBackend::OpenAi, Some("sk-test")));
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().model_name(), "gpt-4o");
    }

    #[test]
    fn backend_parsing() {
        assert_eq!("Gemini".parse::<LlmBackend>().unwrap(), LlmBackend::Gemini);
        assert_eq!("claude".parse::<LlmBackend>().unwrap(), LlmBackend::Anthropic);
        assert!("mistral".parse::<LlmBackend>().is_err());
    }
}
