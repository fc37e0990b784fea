use std::sync::Arc;

use anyhow::Context;

use email_classifier::config::{AppConfig, Strategy};
use email_classifier::pipeline::Pipeline;
use email_classifier::routes::app_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    eprintln!("📧 Email Classifier v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Strategy: {}", config.strategy.as_str());
    match config.strategy {
        Strategy::Local => {
            eprintln!("   Sentiment model: {}", config.sentiment.model);
            eprintln!("   Action keywords: {}", config.action_keywords.join(", "));
        }
        Strategy::Llm => {
            eprintln!(
                "   LLM: {} ({})",
                config.llm.model,
                config.llm.backend.as_str()
            );
            if config.llm.api_key.is_none() {
                eprintln!(
                    "   Warning: {} not set; requests will fail until it is",
                    config.llm.backend.api_key_var()
                );
            }
        }
    }
    eprintln!("   Listening: http://{}\n", config.listen_addr());

    let pipeline = Arc::new(Pipeline::from_config(&config)?);
    let app = app_routes(pipeline, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;
    tracing::info!(addr = %config.listen_addr(), "HTTP server started");
    axum::serve(listener, app).await?;

    Ok(())
}
