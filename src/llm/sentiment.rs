//! Sentiment classification through a Hugging Face inference endpoint.
//!
//! The model is treated as an opaque `text -> {label, score}` function. Label
//! codes come back either as `LABEL_0..2` or as plain names depending on the
//! model revision; both decode to [`SentimentLabel`].

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SentimentConfig;
use crate::error::SentimentError;

/// Three-way sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl SentimentLabel {
    /// Decode an opaque model label code.
    pub fn from_code(code: &str) -> Result<Self, SentimentError> {
        match code.trim().to_lowercase().as_str() {
            "label_0" | "negative" => Ok(Self::Negative),
            "label_1" | "neutral" => Ok(Self::Neutral),
            "label_2" | "positive" => Ok(Self::Positive),
            _ => Err(SentimentError::UnknownLabel(code.to_string())),
        }
    }

    pub fn is_positive(self) -> bool {
        self == Self::Positive
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Positive => "positive",
        }
    }
}

/// Top label returned by the model for a text.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentScore {
    pub label: SentimentLabel,
    /// Raw code as returned by the model.
    pub code: String,
    pub score: f32,
}

/// Anything that can label text with a sentiment.
#[async_trait]
pub trait SentimentModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn analyze(&self, text: &str) -> Result<SentimentScore, SentimentError>;
}

/// One `{label, score}` entry in an inference payload.
#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f32,
}

/// Text-classification payloads come nested per input or flat.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferencePayload {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    options: InferenceOptions,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

/// Parse a raw inference response body and keep the highest-scoring label.
fn parse_inference_payload(body: &str) -> Result<SentimentScore, SentimentError> {
    let payload: InferencePayload = serde_json::from_str(body)
        .map_err(|e| SentimentError::InvalidResponse(format!("JSON parse error: {e}")))?;

    let entries = match payload {
        InferencePayload::Nested(mut outer) => {
            if outer.is_empty() {
                Vec::new()
            } else {
                outer.swap_remove(0)
            }
        }
        InferencePayload::Flat(entries) => entries,
    };

    let top = entries
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| SentimentError::InvalidResponse("no labels in response".into()))?;

    Ok(SentimentScore {
        label: SentimentLabel::from_code(&top.label)?,
        code: top.label,
        score: top.score,
    })
}

/// Sentiment model served by the Hugging Face inference API.
pub struct HuggingFaceSentiment {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_token: Option<SecretString>,
}

impl HuggingFaceSentiment {
    /// Prepare the model handle. Performs no network I/O.
    pub fn load(config: &SentimentConfig) -> Result<Self, SentimentError> {
        let endpoint = config.endpoint();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(SentimentError::RequestFailed(format!(
                "invalid inference URL: {endpoint}"
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SentimentError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            api_token: config.api_token.clone(),
        })
    }
}

#[async_trait]
impl SentimentModel for HuggingFaceSentiment {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn analyze(&self, text: &str) -> Result<SentimentScore, SentimentError> {
        let body = InferenceRequest {
            inputs: text,
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(ref token) = self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| SentimentError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SentimentError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(SentimentError::Status {
                status: status.as_u16(),
                body: text.chars().take(200).collect(),
            });
        }

        let score = parse_inference_payload(&text)?;
        debug!(
            model = %self.model,
            label = score.label.as_str(),
            score = score.score,
            "Sentiment analyzed"
        );
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn decodes_numeric_and_named_codes() {
        assert_eq!(SentimentLabel::from_code("LABEL_0").unwrap(), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_code("LABEL_1").unwrap(), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_code("LABEL_2").unwrap(), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_code("Positive").unwrap(), SentimentLabel::Positive);
        assert!(matches!(
            SentimentLabel::from_code("LABEL_3"),
            Err(SentimentError::UnknownLabel(_))
        ));
    }

    #[test]
    fn parses_nested_payload_and_picks_top_label() {
        let body = r#"[[{"label":"negative","score":0.1},{"label":"positive","score":0.85},{"label":"neutral","score":0.05}]]"#;
        let score = parse_inference_payload(body).unwrap();
        assert_eq!(score.label, SentimentLabel::Positive);
        assert_eq!(score.code, "positive");
        assert!((score.score - 0.85).abs() < 1e-6);
    }

    #[test]
    fn parses_flat_payload() {
        let body = r#"[{"label":"LABEL_1","score":0.7},{"label":"LABEL_0","score":0.3}]"#;
        let score = parse_inference_payload(body).unwrap();
        assert_eq!(score.label, SentimentLabel::Neutral);
    }

    #[test]
    fn empty_payload_is_invalid() {
        assert!(matches!(
            parse_inference_payload("[[]]"),
            Err(SentimentError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_inference_payload(r#"{"error":"Model is loading"}"#),
            Err(SentimentError::InvalidResponse(_))
        ));
    }

    #[test]
    fn load_rejects_non_http_endpoint() {
        let config = SentimentConfig {
            model: "m".into(),
            base_url: "ftp://example.com".into(),
            api_token: None,
            timeout: None,
        };
        assert!(HuggingFaceSentiment::load(&config).is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_request_failure() {
        let config = SentimentConfig {
            model: "m".into(),
            // Port 9 (discard) on localhost is almost never listening.
            base_url: "http://127.0.0.1:9".into(),
            api_token: None,
            timeout: Some(Duration::from_secs(2)),
        };
        let model = HuggingFaceSentiment::load(&config).unwrap();
        let err = model.analyze("hello").await.unwrap_err();
        assert!(matches!(err, SentimentError::RequestFailed(_)));
    }
}
