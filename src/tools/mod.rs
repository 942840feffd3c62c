//! Retrieval capabilities
//!
//! Each tool wraps one external information source. Tools never fail with
//! `Err`: every fetch problem is folded into a `ToolResult::Error` so the
//! owning agent can describe it in natural language.

use crate::models::{ToolRequest, ToolResult};
use crate::oracle::ToolSpec;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub mod history;
pub mod search;

pub use history::{PriceSource, StockHistoryTool, YahooFinanceSource};
pub use search::{DuckDuckGoProvider, SearchProvider, WebSearchTool};

/// Browser-like agent string; several providers reject default client agents
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Trait for a single capability
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON schema of the argument object
    fn parameters(&self) -> Value;
    async fn execute(&self, request: &ToolRequest) -> ToolResult;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

pub(crate) fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .pool_idle_timeout(Duration::from_secs(60))
        .pool_max_idle_per_host(8)
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

fn mismatched_request(tool: &str, request: &ToolRequest) -> ToolResult {
    ToolResult::error(format!(
        "{} cannot handle a {} request",
        tool,
        request.tool_name()
    ))
}
