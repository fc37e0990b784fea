//! Error types for the email classifier.
//!
//! Each layer has its own enum; the pipeline folds them into a single
//! [`ProcessError`] carrying an [`ErrorKind`] before anything reaches a caller.

use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Text extraction errors.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("File is not valid UTF-8 text: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Failed to extract text from PDF: {0}")]
    Extraction(String),
}

/// Sentiment model errors.
#[derive(Debug, thiserror::Error)]
pub enum SentimentError {
    #[error("Sentiment model request failed: {0}")]
    RequestFailed(String),

    #[error("Sentiment model returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected sentiment model response: {0}")]
    InvalidResponse(String),

    #[error("Unknown sentiment label code: {0}")]
    UnknownLabel(String),
}

/// Generative model (LLM) errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Classification errors, shared by both strategies.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("Classification service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Upstream model error: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<SentimentError> for ClassifyError {
    fn from(err: SentimentError) -> Self {
        match err {
            SentimentError::RequestFailed(_) | SentimentError::Status { .. } => {
                Self::ServiceUnavailable(err.to_string())
            }
            SentimentError::InvalidResponse(_) | SentimentError::UnknownLabel(_) => {
                Self::Upstream(err.to_string())
            }
        }
    }
}

impl From<LlmError> for ClassifyError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Config(config) => Self::Config(config),
            other => Self::Upstream(other.to_string()),
        }
    }
}

/// Failure taxonomy surfaced across the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    UnsupportedFormat,
    EmptyContent,
    EncodingError,
    ExtractionError,
    ServiceUnavailable,
    UpstreamError,
    InternalError,
}

impl ErrorKind {
    /// HTTP status for this kind.
    pub fn status(self) -> StatusCode {
        match self {
            Self::BadRequest
            | Self::UnsupportedFormat
            | Self::EmptyContent
            | Self::EncodingError
            | Self::ExtractionError => StatusCode::BAD_REQUEST,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::UpstreamError => StatusCode::BAD_GATEWAY,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for logging.
    pub fn label(self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::UnsupportedFormat => "unsupported_format",
            Self::EmptyContent => "empty_content",
            Self::EncodingError => "encoding_error",
            Self::ExtractionError => "extraction_error",
            Self::ServiceUnavailable => "service_unavailable",
            Self::UpstreamError => "upstream_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Failed processing outcome: a kind plus a caller-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ProcessError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ProcessError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedFormat, message)
    }

    pub fn empty_content(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyContent, message)
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

impl From<ExtractError> for ProcessError {
    fn from(err: ExtractError) -> Self {
        let kind = match err {
            ExtractError::Encoding(_) => ErrorKind::EncodingError,
            ExtractError::Extraction(_) => ErrorKind::ExtractionError,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<ClassifyError> for ProcessError {
    fn from(err: ClassifyError) -> Self {
        let kind = match err {
            ClassifyError::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            ClassifyError::Upstream(_) => ErrorKind::UpstreamError,
            ClassifyError::Config(_) => ErrorKind::InternalError,
        };
        Self::new(kind, err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    kind: ErrorKind,
}

impl IntoResponse for ProcessError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            kind: self.kind,
        };
        (self.status(), Json(body)).into_response()
    }
}
