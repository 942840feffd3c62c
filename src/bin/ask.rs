use stock_voice_assistant::{config::AppConfig, pipeline::SessionPipeline, Role};
use tracing_subscriber::EnvFilter;

const DEFAULT_QUERY: &str = "What is the stock price of AAPL and what are the recent news about it?";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let query = if args.is_empty() {
        DEFAULT_QUERY.to_string()
    } else {
        args.join(" ")
    };

    let pipeline = SessionPipeline::from_config(&config)?;
    let trace = pipeline.ask(&query).await?;

    for turn in trace.turns() {
        match (turn.role, turn.name.as_deref()) {
            (Role::User, _) => println!("User: {}", turn.content),
            (Role::Assistant, Some(name)) => println!("Assistant ({}): {}", name, turn.content),
            (Role::Assistant, None) => println!("Assistant: {}", turn.content),
        }
        println!();
    }

    Ok(())
}
