//! Rule-based classification: sentiment label plus action keywords.
//!
//! Decision table, first match wins:
//! - positive sentiment → Improdutivo (thanks, praise, greetings)
//! - otherwise, an action keyword present → Produtivo
//! - otherwise → Improdutivo
//!
//! The sentiment model is injected; without one the classifier refuses to
//! guess and reports the service as unavailable.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::config::Strategy;
use crate::error::ClassifyError;
use crate::llm::sentiment::{SentimentLabel, SentimentModel};
use crate::pipeline::types::{Category, ClassificationResult, Classifier};

/// Terms suggesting the sender expects action.
pub const DEFAULT_ACTION_KEYWORDS: &[&str] = &[
    "bloqueado",
    "problema",
    "falha",
    "urgente",
    "defeito",
    "preciso",
    "solicito",
    "reembolso",
    "cancelar",
    "erro",
];

/// Case-insensitive substring matcher over a keyword list.
#[derive(Debug, Clone)]
pub struct KeywordRules {
    /// Escaped alternation of all keywords; `None` when the list is empty.
    regex: Option<Regex>,
}

impl KeywordRules {
    /// Build a matcher from a keyword list. Blank entries are skipped.
    pub fn new<I, S>(keywords: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let regex = if keywords.is_empty() {
            None
        } else {
            let alternation = keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!("(?i)(?:{alternation})"))?)
        };

        Ok(Self { regex })
    }

    /// Matcher over [`DEFAULT_ACTION_KEYWORDS`].
    pub fn default_rules() -> Self {
        Self::new(DEFAULT_ACTION_KEYWORDS).expect("escaped keywords always compile")
    }

    /// First keyword occurrence in `text`, lowercased.
    pub fn first_match(&self, text: &str) -> Option<String> {
        self.regex
            .as_ref()?
            .find(text)
            .map(|m| m.as_str().to_lowercase())
    }
}

/// Apply the decision table. Returns the category and the rule that fired.
pub fn decide(sentiment: SentimentLabel, has_action_keyword: bool) -> (Category, &'static str) {
    if sentiment.is_positive() {
        (Category::Unproductive, "positive sentiment")
    } else if has_action_keyword {
        (Category::Productive, "non-positive sentiment with action keyword")
    } else {
        (Category::Unproductive, "non-positive sentiment without action keyword")
    }
}

/// Strategy A: sentiment model plus keyword tie-breaking.
pub struct RuleClassifier {
    model: Option<Arc<dyn SentimentModel>>,
    rules: KeywordRules,
}

impl RuleClassifier {
    /// `model` is `None` when loading failed at startup.
    pub fn new(model: Option<Arc<dyn SentimentModel>>, rules: KeywordRules) -> Self {
        Self { model, rules }
    }
}

#[async_trait]
impl Classifier for RuleClassifier {
    fn strategy(&self) -> Strategy {
        Strategy::Local
    }

    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifyError> {
        let Some(model) = self.model.as_ref() else {
            return Err(ClassifyError::ServiceUnavailable(
                "sentiment model not loaded".into(),
            ));
        };

        let sentiment = model.analyze(text).await?;
        let keyword = self.rules.first_match(text);
        let (category, rule) = decide(sentiment.label, keyword.is_some());

        let mut reasons = vec![format!(
            "sentiment {} (code {}, score {:.2})",
            sentiment.label.as_str(),
            sentiment.code,
            sentiment.score
        )];
        match keyword {
            Some(ref k) => reasons.push(format!("action keyword '{k}'")),
            None => reasons.push("no action keyword".to_string()),
        }
        reasons.push(format!("rule: {rule} → {}", category.label()));

        debug!(
            model = model.model_name(),
            sentiment = sentiment.label.as_str(),
            keyword = keyword.as_deref().unwrap_or("none"),
            category = category.label(),
            "Rule classification"
        );

        Ok(ClassificationResult {
            category,
            sentiment: Some(sentiment),
            reasons,
            model_response: None,
        })
    }
}
