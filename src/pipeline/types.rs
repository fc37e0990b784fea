//! Shared types for the email processing pipeline.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::Strategy;
use crate::error::{ClassifyError, ProcessError};
use crate::llm::sentiment::SentimentScore;

// ── Submission ──────────────────────────────────────────────────────

/// One inbound email, as pasted text or an uploaded file.
#[derive(Debug, Clone)]
pub enum EmailSubmission {
    /// Inline email body.
    Text(String),
    /// Uploaded file; the kind is resolved from the filename.
    File { filename: String, bytes: Vec<u8> },
}

impl EmailSubmission {
    /// Short label for logging.
    pub fn modality(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::File { .. } => "file",
        }
    }
}

// ── Category ────────────────────────────────────────────────────────

/// Final classification surfaced to the user.
///
/// The rule-based strategy only emits `Productive`/`Unproductive`; the LLM
/// strategy only emits `Priority`/`CanWait`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    #[serde(rename = "Produtivo")]
    Productive,
    #[serde(rename = "Improdutivo")]
    Unproductive,
    #[serde(rename = "Prioritário")]
    Priority,
    #[serde(rename = "Pode Esperar")]
    CanWait,
}

impl Category {
    /// Wire label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Productive => "Produtivo",
            Self::Unproductive => "Improdutivo",
            Self::Priority => "Prioritário",
            Self::CanWait => "Pode Esperar",
        }
    }

    /// Strategy that owns this category.
    pub fn strategy(self) -> Strategy {
        match self {
            Self::Productive | Self::Unproductive => Strategy::Local,
            Self::Priority | Self::CanWait => Strategy::Llm,
        }
    }

    /// Categories a strategy may emit.
    pub fn for_strategy(strategy: Strategy) -> [Category; 2] {
        match strategy {
            Strategy::Local => [Self::Productive, Self::Unproductive],
            Strategy::Llm => [Self::Priority, Self::CanWait],
        }
    }

    /// Match a label from the given strategy's set, ignoring case and
    /// surrounding whitespace.
    pub fn parse_for(strategy: Strategy, label: &str) -> Option<Category> {
        let wanted = label.trim().to_lowercase();
        Self::for_strategy(strategy)
            .into_iter()
            .find(|c| c.label().to_lowercase() == wanted)
    }
}

// ── Classification ──────────────────────────────────────────────────

/// Result of classifying one email.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub category: Category,
    /// Sentiment behind the decision (rule-based strategy only).
    pub sentiment: Option<SentimentScore>,
    /// Human-readable trail of how the category was reached.
    pub reasons: Vec<String>,
    /// Reply produced by the model alongside the category (LLM strategy only).
    pub model_response: Option<String>,
}

/// A classification strategy.
///
/// Selected once at startup; every request goes through the same instance.
#[async_trait]
pub trait Classifier: Send + Sync {
    fn strategy(&self) -> Strategy;

    /// Classify non-empty email text.
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifyError>;
}

// ── Outcome ─────────────────────────────────────────────────────────

/// Successful processing result, as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedEmail {
    pub category: Category,
    pub suggested_response: String,
}

/// Either a processed email or a classified failure, never both.
pub type ProcessingOutcome = Result<ProcessedEmail, ProcessError>;
