//! Email processing pipeline.
//!
//! Every submission, pasted or uploaded, flows through:
//! 1. `extract`: file kind resolution and text extraction
//! 2. `Classifier::classify()`: rule-based or LLM strategy
//! 3. `response::suggest()`: canned reply when the model didn't write one
//!
//! `processor::Pipeline` orchestrates the stages and maps failures to
//! [`ErrorKind`](crate::error::ErrorKind).

pub mod extract;
pub mod processor;
pub mod response;
pub mod rules;
pub mod triage;
pub mod types;

pub use processor::Pipeline;
pub use types::{Category, ClassificationResult, Classifier, EmailSubmission, ProcessedEmail};
