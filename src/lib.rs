//! Email classifier: categorizes an email and suggests a reply.

pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod routes;
