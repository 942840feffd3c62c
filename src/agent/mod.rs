//! Specialized agents
//!
//! An agent owns exactly one capability. On each delegation it runs a bounded
//! loop: ASK ORACLE → CALL TOOL → OBSERVE → ... → ANSWER. Once the tool budget
//! is spent the oracle is asked one last time without tools.

use crate::config::Timeouts;
use crate::deadline::with_deadline;
use crate::models::{AgentResponse, ToolRequest, ToolResult, Turn};
use crate::oracle::{
    turn_messages, OracleMessage, OracleReply, OracleRequest, ReasoningOracle, ToolCall,
};
use crate::tools::Tool;
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const SEARCH_AGENT: &str = "search_agent";
pub const HISTORY_AGENT: &str = "history_agent";

const SEARCH_PROMPT: &str = "You are a stock market research agent. Use the search tool to find \
current information, news and analysis about the stocks or companies the user asks about. \
Summarize the key information and the most recent news in a few clear sentences \
suitable for being read aloud, and mention the sources you relied on. If the search fails, say so plainly instead of guessing.";

const HISTORY_PROMPT: &str = "You are a stock price history agent. Use the history tool to fetch \
daily open, high, low, close and volume data for a ticker symbol over a date range. \
Dates must be YYYY-MM-DD. When the user gives a relative period such as \"last month\", \
compute the dates from today's date. Describe the overall trend, trading volume and any \
significant price changes in a few sentences. \
If no data is returned, tell the user that no data was found for that period.";

/// Work handed to an agent by the supervisor
#[derive(Debug, Clone, PartialEq)]
pub struct Delegation {
    /// What the supervisor wants done
    pub instruction: String,
    /// Conversation so far, oldest first
    pub context: Vec<Turn>,
}

impl Delegation {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            context: vec![],
        }
    }

    pub fn with_context(mut self, context: Vec<Turn>) -> Self {
        self.context = context;
        self
    }
}

#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn handle(&self, delegation: &Delegation) -> Result<AgentResponse>;
}

/// Agent backed by the reasoning oracle and a single tool
pub struct ToolAgent {
    name: String,
    description: String,
    system_prompt: String,
    oracle: Arc<dyn ReasoningOracle>,
    tool: Arc<dyn Tool>,
    max_tool_calls: u32,
    timeouts: Timeouts,
}

impl ToolAgent {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        system_prompt: impl Into<String>,
        oracle: Arc<dyn ReasoningOracle>,
        tool: Arc<dyn Tool>,
        max_tool_calls: u32,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            system_prompt: system_prompt.into(),
            oracle,
            tool,
            max_tool_calls,
            timeouts,
        }
    }

    fn prompt(&self, budget_spent: bool) -> String {
        let mut prompt = format!(
            "{}\n\nToday's date is {}.",
            self.system_prompt,
            Utc::now().date_naive()
        );
        if budget_spent {
            prompt.push_str(
                "\n\nNo more tool calls are available. Answer now using only the results above.",
            );
        }
        prompt
    }

    /// Validate and run one oracle-issued call. Never fails: problems become error results.
    async fn invoke(&self, call: &ToolCall) -> ToolResult {
        let request = match ToolRequest::parse(&call.name, &call.args) {
            Ok(request) => request,
            Err(e) => {
                warn!(agent = %self.name, tool = %call.name, error = %e, "Rejected tool call");
                return ToolResult::error(e.to_string());
            }
        };

        if request.tool_name() != self.tool.name() {
            warn!(agent = %self.name, tool = %call.name, "Tool not available to agent");
            return ToolResult::error(format!(
                "{} is not available to {}",
                call.name, self.name
            ));
        }

        let tool = Arc::clone(&self.tool);
        let execution = async move { Ok(tool.execute(&request).await) };

        match with_deadline("retrieval", self.timeouts.retrieval, execution).await {
            Ok(result) => result,
            Err(e) => ToolResult::error(e.to_string()),
        }
    }

    fn fallback(&self, last_result: Option<&ToolResult>, tool_calls: u32) -> AgentResponse {
        let text = match last_result {
            Some(ToolResult::Error { message }) => format!(
                "I was unable to retrieve the requested information: {}",
                message
            ),
            _ => "I was unable to summarize the requested information in time.".to_string(),
        };

        AgentResponse {
            agent: self.name.clone(),
            text,
            tool_calls,
        }
    }
}

fn delegation_messages(delegation: &Delegation) -> Vec<OracleMessage> {
    let mut messages = turn_messages(&delegation.context);
    messages.push(OracleMessage::User(delegation.instruction.clone()));
    messages
}

#[async_trait]
impl Agent for ToolAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn handle(&self, delegation: &Delegation) -> Result<AgentResponse> {
        let start = Instant::now();
        let tools = vec![self.tool.spec()];
        let mut messages = delegation_messages(delegation);
        let mut tool_calls: u32 = 0;
        let mut last_result: Option<ToolResult> = None;

        info!(
            agent = %self.name,
            instruction = %delegation.instruction,
            "Agent: handling delegation"
        );

        loop {
            let budget_spent = tool_calls >= self.max_tool_calls;

            // === ASK ORACLE ===
            let request = OracleRequest {
                system_prompt: self.prompt(budget_spent),
                messages: messages.clone(),
                tools: if budget_spent { vec![] } else { tools.clone() },
            };

            let reply =
                with_deadline("oracle", self.timeouts.oracle, self.oracle.complete(request))
                    .await?;

            let call = match reply {
                OracleReply::Text(text) if !text.trim().is_empty() => {
                    info!(
                        agent = %self.name,
                        tool_calls,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Agent: answered"
                    );
                    return Ok(AgentResponse {
                        agent: self.name.clone(),
                        text: text.trim().to_string(),
                        tool_calls,
                    });
                }
                OracleReply::Text(_) => {
                    warn!(agent = %self.name, "Oracle returned empty answer");
                    return Ok(self.fallback(last_result.as_ref(), tool_calls));
                }
                OracleReply::ToolCall(call) if budget_spent => {
                    warn!(
                        agent = %self.name,
                        tool = %call.name,
                        "Tool call after budget was spent, answering with fallback"
                    );
                    return Ok(self.fallback(last_result.as_ref(), tool_calls));
                }
                OracleReply::ToolCall(call) => call,
            };

            // === CALL TOOL ===
            tool_calls += 1;
            debug!(agent = %self.name, tool = %call.name, args = %call.args, "Agent: calling tool");
            let result = self.invoke(&call).await;

            // === OBSERVE ===
            debug!(
                agent = %self.name,
                success = result.is_success(),
                fingerprint = %result.fingerprint(),
                "Agent: tool result"
            );
            messages.push(OracleMessage::ToolCall(call.clone()));
            messages.push(OracleMessage::ToolResponse {
                name: call.name,
                payload: result.to_json(),
            });
            last_result = Some(result);
        }
    }
}

pub fn search_agent(
    oracle: Arc<dyn ReasoningOracle>,
    tool: Arc<dyn Tool>,
    max_tool_calls: u32,
    timeouts: Timeouts,
) -> ToolAgent {
    ToolAgent::new(
        SEARCH_AGENT,
        "Searches the web and news for current information about stocks and companies",
        SEARCH_PROMPT,
        oracle,
        tool,
        max_tool_calls,
        timeouts,
    )
}

pub fn history_agent(
    oracle: Arc<dyn ReasoningOracle>,
    tool: Arc<dyn Tool>,
    max_tool_calls: u32,
    timeouts: Timeouts,
) -> ToolAgent {
    ToolAgent::new(
        HISTORY_AGENT,
        "Fetches historical daily price data for a stock ticker over a date range",
        HISTORY_PROMPT,
        oracle,
        tool,
        max_tool_calls,
        timeouts,
    )
}
