//! Core data models for the assistant

use crate::error::AssistantError;
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::fmt;

/// Tool name of the web/news search capability
pub const SEARCH_TOOL: &str = "search_duckduckgo";

/// Tool name of the historical price capability
pub const HISTORY_TOOL: &str = "fetch_stock_history";

/// Message returned when a price lookup yields an empty series
pub const NO_DATA_MESSAGE: &str = "No data found for the given period.";

//
// ================= Conversation =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub role: Role,
    /// Speaker of an assistant turn (supervisor or agent name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            name: None,
            content: content.into(),
        }
    }

    pub fn assistant(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            name: Some(name.into()),
            content: content.into(),
        }
    }
}

/// Ordered, append-only sequence of turns
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    /// Fresh single-turn conversation for one user query
    pub fn from_query(query: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::user(query)],
        }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn latest_user(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == Role::User)
    }

    pub fn last_assistant(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == Role::Assistant)
    }

    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }
}

//
// ================= Tool Requests =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchArgs {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryArgs {
    pub ticker: String,
    pub start_date: String,
    pub end_date: String,
}

/// Validated price-history query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl HistoryArgs {
    pub fn validate(&self) -> Result<HistoryQuery> {
        let ticker = self.ticker.trim();
        if ticker.is_empty() {
            return Err(AssistantError::InvalidToolInput(
                "ticker must not be empty".to_string(),
            ));
        }

        let start = parse_iso_date("start_date", &self.start_date)?;
        let end = parse_iso_date("end_date", &self.end_date)?;

        if start > end {
            return Err(AssistantError::InvalidToolInput(format!(
                "start_date {} is after end_date {}",
                start, end
            )));
        }

        Ok(HistoryQuery {
            ticker: ticker.to_uppercase(),
            start,
            end,
        })
    }
}

fn parse_iso_date(field: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        AssistantError::InvalidToolInput(format!(
            "{} must be a YYYY-MM-DD date, got '{}'",
            field, raw
        ))
    })
}

/// Capability invocation, discriminated by capability
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "capability", rename_all = "snake_case")]
pub enum ToolRequest {
    Search(SearchArgs),
    StockHistory(HistoryArgs),
}

impl ToolRequest {
    /// Validate an oracle-issued call before anything is dispatched.
    pub fn parse(tool_name: &str, args: &Value) -> Result<Self> {
        let object = args.as_object().ok_or_else(|| {
            AssistantError::InvalidToolInput(format!("{} arguments must be a JSON object", tool_name))
        })?;

        let field = |key: &str| -> Result<String> {
            let value = object
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default();
            if value.is_empty() {
                Err(AssistantError::InvalidToolInput(format!(
                    "{} requires a non-empty '{}' string",
                    tool_name, key
                )))
            } else {
                Ok(value.to_string())
            }
        };

        match tool_name {
            SEARCH_TOOL => Ok(ToolRequest::Search(SearchArgs {
                query: field("query")?,
            })),
            HISTORY_TOOL => Ok(ToolRequest::StockHistory(HistoryArgs {
                ticker: field("ticker")?,
                start_date: field("start_date")?,
                end_date: field("end_date")?,
            })),
            other => Err(AssistantError::InvalidToolInput(format!(
                "unknown tool '{}'",
                other
            ))),
        }
    }

    pub fn tool_name(&self) -> &'static str {
        match self {
            ToolRequest::Search(_) => SEARCH_TOOL,
            ToolRequest::StockHistory(_) => HISTORY_TOOL,
        }
    }
}

//
// ================= Tool Results =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextResult {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsResult {
    pub title: String,
    pub snippet: String,
    pub link: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsSummary {
    pub title: String,
    pub summary: String,
    pub source: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResults {
    pub text_results: Vec<TextResult>,
    pub news_results: Vec<NewsResult>,
    pub news_summaries: Vec<NewsSummary>,
}

/// One trading day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolPayload {
    Search(SearchResults),
    History(Vec<PriceRecord>),
}

/// Outcome of one capability call. Atomic: either a full payload or a message.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Success(ToolPayload),
    Error { message: String },
}

impl ToolResult {
    pub fn error(message: impl Into<String>) -> Self {
        ToolResult::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success(_))
    }

    /// Wire form handed to the oracle
    pub fn to_json(&self) -> Value {
        match self {
            ToolResult::Success(ToolPayload::Search(results)) => json!({
                "status": "success",
                "results": results,
            }),
            ToolResult::Success(ToolPayload::History(records)) => json!({
                "status": "success",
                "data": records,
            }),
            ToolResult::Error { message } => json!({
                "status": "error",
                "message": message,
                "data": null,
            }),
        }
    }

    /// SHA-256 of the canonical wire form
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(&self.to_json()).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }
}

//
// ================= Agents & Routing =================
//

/// Natural-language output of a specialized agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentResponse {
    pub agent: String,
    pub text: String,
    pub tool_calls: u32,
}

/// What the supervisor chose to do on one routing step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    Delegate { agent: String, task: String },
    Respond(String),
}

impl RoutingDecision {
    /// Closing text, present only for `Respond`
    pub fn answer(&self) -> Option<&str> {
        match self {
            RoutingDecision::Respond(text) => Some(text),
            RoutingDecision::Delegate { .. } => None,
        }
    }
}

impl fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingDecision::Delegate { agent, .. } => write!(f, "delegate to {}", agent),
            RoutingDecision::Respond(text) => {
                write!(f, "respond ({} chars)", text.chars().count())
            }
        }
    }
}

//
// ================= Final Result =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineResponse {
    pub transcription: String,
    pub response: String,
    pub audio_url: String,
}
