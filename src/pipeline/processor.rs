//! Email pipeline: extracts, classifies and answers one submission.
//!
//! Flow (`Received → Extracted → Classified → Responded`):
//! 1. Resolve the submission to trimmed text (file kind checked first)
//! 2. Reject empty text
//! 3. Classify with the strategy chosen at startup
//! 4. Attach the model reply or the canned one
//!
//! Any stage may exit with a [`ProcessError`]; nothing is retried.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::{AppConfig, Strategy};
use crate::error::{ConfigError, ErrorKind, ProcessError};
use crate::llm::sentiment::{HuggingFaceSentiment, SentimentModel};
use crate::pipeline::extract::{FileKind, extract};
use crate::pipeline::response::suggest;
use crate::pipeline::rules::{KeywordRules, RuleClassifier};
use crate::pipeline::triage::LlmClassifier;
use crate::pipeline::types::{Classifier, EmailSubmission, ProcessedEmail, ProcessingOutcome};

/// Shared, read-only request pipeline.
pub struct Pipeline {
    classifier: Arc<dyn Classifier>,
}

impl Pipeline {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    /// Build the pipeline for the configured strategy.
    ///
    /// A sentiment model that fails to load is not fatal: the server starts
    /// and every request is answered with `ServiceUnavailable`.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let classifier: Arc<dyn Classifier> = match config.strategy {
            Strategy::Local => {
                let rules = KeywordRules::new(&config.action_keywords).map_err(|e| {
                    ConfigError::InvalidValue {
                        key: "EMAIL_ACTION_KEYWORDS".into(),
                        message: e.to_string(),
                    }
                })?;
                let model: Option<Arc<dyn SentimentModel>> =
                    match HuggingFaceSentiment::load(&config.sentiment) {
                        Ok(model) => {
                            info!(model = %config.sentiment.model, "Sentiment model loaded");
                            Some(Arc::new(model))
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to load sentiment model");
                            None
                        }
                    };
                Arc::new(RuleClassifier::new(model, rules))
            }
            Strategy::Llm => Arc::new(LlmClassifier::new(config.llm.clone())),
        };
        Ok(Self::new(classifier))
    }

    pub fn strategy(&self) -> Strategy {
        self.classifier.strategy()
    }

    /// Process one submission end to end.
    pub async fn process(&self, submission: EmailSubmission) -> ProcessingOutcome {
        let modality = submission.modality();
        let outcome = self.run(submission).await;
        match &outcome {
            Ok(processed) => info!(
                modality,
                category = processed.category.label(),
                "Email processed"
            ),
            Err(e) => warn!(
                modality,
                kind = e.kind.label(),
                error = %e.message,
                "Email processing failed"
            ),
        }
        outcome
    }

    /// Convenience wrapper for inline text.
    pub async fn process_text(&self, content: impl Into<String>) -> ProcessingOutcome {
        self.process(EmailSubmission::Text(content.into())).await
    }

    /// Convenience wrapper for an uploaded file.
    pub async fn process_file(
        &self,
        filename: impl Into<String>,
        bytes: Vec<u8>,
    ) -> ProcessingOutcome {
        self.process(EmailSubmission::File {
            filename: filename.into(),
            bytes,
        })
        .await
    }

    async fn run(&self, submission: EmailSubmission) -> ProcessingOutcome {
        // Extracted
        let text = match submission {
            EmailSubmission::Text(content) => content.trim().to_string(),
            EmailSubmission::File { filename, bytes } => {
                let kind = FileKind::from_filename(&filename).ok_or_else(|| {
                    ProcessError::unsupported_format(format!(
                        "Unsupported file format '{filename}'. Use .txt or .pdf"
                    ))
                })?;
                extract(&bytes, kind)?
            }
        };

        if text.is_empty() {
            return Err(ProcessError::empty_content(
                "The email is empty or no text could be extracted",
            ));
        }

        // Classified
        let classification = self.classifier.classify(&text).await?;

        let strategy = self.classifier.strategy();
        if classification.category.strategy() != strategy {
            return Err(ProcessError::new(
                ErrorKind::InternalError,
                format!(
                    "classifier emitted category '{}' outside the {} set",
                    classification.category.label(),
                    strategy.as_str()
                ),
            ));
        }

        // Responded
        let suggested_response = match classification.model_response {
            Some(reply) => reply,
            None => suggest(classification.category).to_string(),
        };

        Ok(ProcessedEmail {
            category: classification.category,
            suggested_response,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::ClassifyError;
    use crate::llm::sentiment::SentimentLabel;
    use crate::pipeline::extract::test_pdf;
    use crate::pipeline::response::{REQUEST_RECEIVED_REPLY, THANKS_REPLY};
    use crate::pipeline::rules::test_support::FixedSentiment;
    use crate::pipeline::types::{Category, ClassificationResult};

    fn rule_pipeline(label: SentimentLabel) -> Pipeline {
        let classifier = RuleClassifier::new(
            Some(Arc::new(FixedSentiment(label))),
            KeywordRules::default_rules(),
        );
        Pipeline::new(Arc::new(classifier))
    }

    /// Classifier that records calls and returns a fixed result.
    struct CountingClassifier {
        strategy: Strategy,
        result: Result<ClassificationResult, fn() -> ClassifyError>,
        calls: AtomicUsize,
    }

    impl CountingClassifier {
        fn returning(strategy: Strategy, category: Category, reply: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                strategy,
                result: Ok(ClassificationResult {
                    category,
                    sentiment: None,
                    reasons: vec![],
                    model_response: reply.map(String::from),
                }),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(err: fn() -> ClassifyError) -> Arc<Self> {
            Arc::new(Self {
                strategy: Strategy::Llm,
                result: Err(err),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Classifier for CountingClassifier {
        fn strategy(&self) -> Strategy {
            self.strategy
        }

        async fn classify(&self, _text: &str) -> Result<ClassificationResult, ClassifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(result) => Ok(result.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    #[tokio::test]
    async fn productive_scenario() {
        let processed = rule_pipeline(SentimentLabel::Negative)
            .process_text("Preciso de reembolso urgente, sistema bloqueado")
            .await
            .unwrap();
        assert_eq!(processed.category, Category::Productive);
        assert_eq!(processed.suggested_response, REQUEST_RECEIVED_REPLY);
    }

    #[tokio::test]
    async fn unproductive_scenario() {
        let processed = rule_pipeline(SentimentLabel::Positive)
            .process_text("Muito obrigado pela ajuda, excelente atendimento!")
            .await
            .unwrap();
        assert_eq!(processed.category, Category::Unproductive);
        assert_eq!(processed.suggested_response, THANKS_REPLY);
    }

    #[tokio::test]
    async fn empty_text_skips_classification() {
        let classifier = CountingClassifier::returning(Strategy::Local, Category::Productive, None);
        let pipeline = Pipeline::new(classifier.clone());

        let err = pipeline.process_text("   \n ").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmptyContent);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unsupported_extension_skips_extraction_and_classification() {
        let classifier = CountingClassifier::returning(Strategy::Local, Category::Productive, None);
        let pipeline = Pipeline::new(classifier.clone());

        let err = pipeline
            .process_file("email.docx", b"Preciso de ajuda".to_vec())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedFormat);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn txt_file_is_classified() {
        let processed = rule_pipeline(SentimentLabel::Neutral)
            .process_file("Email.TXT", "Solicito cancelar minha assinatura.".as_bytes().to_vec())
            .await
            .unwrap();
        assert_eq!(processed.category, Category::Productive);
    }

    #[tokio::test]
    async fn invalid_utf8_txt_is_encoding_error() {
        let err = rule_pipeline(SentimentLabel::Neutral)
            .process_file("email.txt", vec![0xc3, 0x28, 0xa0])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::EncodingError);
    }

    #[tokio::test]
    async fn blank_pdf_is_empty_content() {
        let bytes = test_pdf::with_pages(&[None, None, None]);
        let err = rule_pipeline(SentimentLabel::Neutral)
            .process_file("scan.pdf", bytes)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmptyContent);
    }

    #[tokio::test]
    async fn pdf_text_is_classified() {
        let bytes = test_pdf::with_pages(&[Some("Sistema com erro, preciso de suporte")]);
        let processed = rule_pipeline(SentimentLabel::Negative)
            .process_file("email.pdf", bytes)
            .await
            .unwrap();
        assert_eq!(processed.category, Category::Productive);
    }

    #[tokio::test]
    async fn corrupt_pdf_is_extraction_error() {
        let err = rule_pipeline(SentimentLabel::Neutral)
            .process_file("email.pdf", b"garbage".to_vec())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExtractionError);
    }

    #[tokio::test]
    async fn model_reply_replaces_canned_reply() {
        let classifier = CountingClassifier::returning(
            Strategy::Llm,
            Category::Priority,
            Some("Vamos verificar agora mesmo."),
        );
        let processed = Pipeline::new(classifier).process_text("Oi").await.unwrap();
        assert_eq!(processed.category, Category::Priority);
        assert_eq!(processed.suggested_response, "Vamos verificar agora mesmo.");
    }

    #[tokio::test]
    async fn classifier_failures_keep_their_kind() {
        let unavailable =
            CountingClassifier::failing(|| ClassifyError::ServiceUnavailable("down".into()));
        let err = Pipeline::new(unavailable).process_text("Oi").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);

        let upstream = CountingClassifier::failing(|| ClassifyError::Upstream("bad json".into()));
        let err = Pipeline::new(upstream).process_text("Oi").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UpstreamError);
    }

    #[tokio::test]
    async fn category_outside_strategy_set_is_rejected() {
        let classifier = CountingClassifier::returning(Strategy::Local, Category::Priority, None);
        let err = Pipeline::new(classifier).process_text("Oi").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InternalError);
    }

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        AppConfig::from_lookup(|key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    #[tokio::test]
    async fn failed_model_load_still_builds_pipeline() {
        let config = config_from(&[("HF_INFERENCE_URL", "not-a-url")]);
        let pipeline = Pipeline::from_config(&config).unwrap();
        assert_eq!(pipeline.strategy(), Strategy::Local);

        let err = pipeline.process_text("Preciso de ajuda").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    }

    #[tokio::test]
    async fn llm_strategy_without_key_fails_per_request() {
        let config = config_from(&[("EMAIL_CLASSIFIER", "llm")]);
        let pipeline = Pipeline::from_config(&config).unwrap();
        assert_eq!(pipeline.strategy(), Strategy::Llm);

        let err = pipeline.process_text("Oi").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InternalError);
        assert!(err.message.contains("GEMINI_API_KEY"));
    }
}
