use std::sync::Arc;
use stock_voice_assistant::{api::start_server, config::AppConfig, pipeline::SessionPipeline};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (and .env) before the filter reads RUST_LOG
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if config.gemini_api_key.is_empty() {
        warn!("GEMINI_API_KEY not set; every question will fail until it is configured");
    }
    if config.speech_api_key.is_empty() {
        warn!("SPEECH_API_KEY not set; /transcribe/ will report the speech service as unavailable");
    }

    info!("Stock Voice Assistant - API Server");
    info!(?config, "Configuration loaded");

    let pipeline = Arc::new(SessionPipeline::from_config(&config)?);

    start_server(pipeline, &config).await?;

    Ok(())
}
