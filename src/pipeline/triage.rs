//! LLM-based classification: one prompt returns category and reply together.
//!
//! Flow:
//! 1. Build the fixed instruction with the email embedded verbatim
//! 2. Call the hosted model (client built lazily on first use)
//! 3. Extract and validate the single JSON object in the reply

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::Strategy;
use crate::error::ClassifyError;
use crate::llm::{GenerativeModel, LlmConfig, create_provider};
use crate::pipeline::types::{Category, ClassificationResult, Classifier};

/// Strategy B: hosted generative model.
pub struct LlmClassifier {
    config: LlmConfig,
    model: OnceCell<Arc<dyn GenerativeModel>>,
}

impl LlmClassifier {
    /// The provider is created on the first `classify` call, so a missing
    /// API key only surfaces then.
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            model: OnceCell::new(),
        }
    }

    /// Use an already-built model instead of creating one from `config`.
    pub fn with_model(config: LlmConfig, model: Arc<dyn GenerativeModel>) -> Self {
        Self {
            config,
            model: OnceCell::new_with(Some(model)),
        }
    }

    async fn model(&self) -> Result<&Arc<dyn GenerativeModel>, ClassifyError> {
        let model = self
            .model
            .get_or_try_init(|| async {
                info!(backend = self.config.backend.as_str(), "Creating LLM provider");
                create_provider(&self.config)
            })
            .await?;
        Ok(model)
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    fn strategy(&self) -> Strategy {
        Strategy::Llm
    }

    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifyError> {
        let model = self.model().await?;
        let prompt = build_classification_prompt(text);

        let raw = model.generate(&prompt).await?;
        debug!(model = model.model_name(), chars = raw.len(), "LLM classification received");

        let parsed = parse_classification_response(&raw).map_err(|e| {
            warn!(raw_response = %raw, error = %e, "Failed to parse classification response");
            ClassifyError::Upstream(format!("parse failed: {e}"))
        })?;

        Ok(ClassificationResult {
            category: parsed.category,
            sentiment: None,
            reasons: vec![format!(
                "model {} chose {}",
                model.model_name(),
                parsed.category.label()
            )],
            model_response: Some(parsed.suggested_response),
        })
    }
}

// ── Prompt construction ─────────────────────────────────────────────

/// Build the classification instruction with the email embedded verbatim.
pub fn build_classification_prompt(email: &str) -> String {
    let [priority, can_wait] = Category::for_strategy(Strategy::Llm);
    format!(
        "You are an assistant that triages customer emails for a support team.\n\n\
         Classify the email below into exactly one category:\n\
         - \"{priority}\": the sender needs action, a status update or an answer soon.\n\
         - \"{can_wait}\": thanks, greetings, announcements or anything needing no prompt action.\n\n\
         Then write a short, polite reply in the same language as the email.\n\n\
         Respond with ONLY a JSON object, no markdown:\n\
         {{\"category\": \"{priority}\" or \"{can_wait}\", \"suggested_response\": \"...\"}}\n\n\
         Email:\n{email}",
        priority = priority.label(),
        can_wait = can_wait.label(),
    )
}

// ── Response parsing ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawClassification {
    category: String,
    suggested_response: String,
}

/// Validated model output.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedClassification {
    pub category: Category,
    pub suggested_response: String,
}

/// Parse the model reply into a category from the LLM set and a reply.
pub fn parse_classification_response(raw: &str) -> Result<ParsedClassification, String> {
    let json_str = extract_json_object(raw).ok_or("no JSON object in response")?;
    let response: RawClassification =
        serde_json::from_str(json_str).map_err(|e| format!("JSON parse error: {e}"))?;

    let category = Category::parse_for(Strategy::Llm, &response.category)
        .ok_or_else(|| format!("unknown category: '{}'", response.category))?;

    let suggested_response = response.suggested_response.trim().to_string();
    if suggested_response.is_empty() {
        return Err("empty suggested_response".into());
    }

    Ok(ParsedClassification {
        category,
        suggested_response,
    })
}

/// Locate the JSON object in model output (handles markdown fences and
/// surrounding prose).
fn extract_json_object(text: &str) -> Option<&str> {
    let trimmed = text.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return Some(after[..end].trim());
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => Some(&trimmed[start..=end]),
        _ => None,
    }
}
