//! Configuration types.
//!
//! Everything is read once from the environment at startup into an immutable
//! [`AppConfig`], which is then handed to the components that need it.

use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};
use crate::pipeline::rules::DEFAULT_ACTION_KEYWORDS;

/// Default Hugging Face model used for sentiment classification.
pub const DEFAULT_SENTIMENT_MODEL: &str = "cardiffnlp/twitter-roberta-base-sentiment-latest";

/// Default Hugging Face inference base URL (model name is appended).
pub const DEFAULT_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// Default upload limit for `/process_file` (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Which classification strategy the server runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Sentiment model plus keyword rules, canned replies.
    Local,
    /// Hosted generative model returning category and reply together.
    Llm,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Llm => "llm",
        }
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "rules" => Ok(Self::Local),
            "llm" | "remote" => Ok(Self::Llm),
            other => Err(ConfigError::InvalidValue {
                key: "EMAIL_CLASSIFIER".into(),
                message: format!("unknown strategy '{other}', expected 'local' or 'llm'"),
            }),
        }
    }
}

/// Settings for the sentiment inference endpoint.
#[derive(Debug, Clone)]
pub struct SentimentConfig {
    /// Model identifier on the inference endpoint.
    pub model: String,
    /// Base URL; the model identifier is appended as a path segment.
    pub base_url: String,
    /// Optional bearer token.
    pub api_token: Option<SecretString>,
    /// Per-request timeout; `None` keeps the HTTP client default.
    pub timeout: Option<Duration>,
}

impl SentimentConfig {
    /// Full inference URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.model)
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Classification strategy selected at startup.
    pub strategy: Strategy,
    /// Terms that mark an email as expecting action.
    pub action_keywords: Vec<String>,
    /// Maximum accepted request body for file uploads.
    pub max_upload_bytes: usize,
    pub sentiment: SentimentConfig,
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Build configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unparseable numeric values fall back to their defaults; an unknown
    /// strategy or LLM backend name is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let bind_addr = var("EMAIL_BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = var("EMAIL_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);

        let strategy = match var("EMAIL_CLASSIFIER") {
            Some(s) => s.parse()?,
            None => Strategy::Local,
        };

        let action_keywords: Vec<String> = match var("EMAIL_ACTION_KEYWORDS") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_ACTION_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        };

        let max_upload_bytes: usize = var("EMAIL_MAX_UPLOAD_BYTES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let timeout = var("EMAIL_MODEL_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs);

        let sentiment = SentimentConfig {
            model: var("HF_MODEL").unwrap_or_else(|| DEFAULT_SENTIMENT_MODEL.to_string()),
            base_url: var("HF_INFERENCE_URL").unwrap_or_else(|| DEFAULT_INFERENCE_URL.to_string()),
            api_token: var("HF_API_TOKEN").map(SecretString::from),
            timeout,
        };

        let backend = match var("EMAIL_LLM_BACKEND") {
            Some(s) => s.parse()?,
            None => LlmBackend::Gemini,
        };
        // A missing key is only reported when the LLM strategy is first used.
        let llm = LlmConfig {
            backend,
            api_key: var(backend.api_key_var()).map(SecretString::from),
            model: var("EMAIL_LLM_MODEL").unwrap_or_else(|| backend.default_model().to_string()),
            temperature: 0.2,
            max_tokens: 1024,
        };

        Ok(Self {
            bind_addr,
            port,
            strategy,
            action_keywords,
            max_upload_bytes,
            sentiment,
            llm,
        })
    }

    /// `host:port` string for the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}
