//! Supervisor - routes a conversation to the specialized agents
//!
//! ROUTING → DELEGATING* → FINALIZING
//!
//! The oracle sees the conversation plus one handoff tool per agent
//! (`transfer_to_<agent>`). Every handoff runs the agent and feeds its reply
//! back. The returned conversation is the full trace: input turns, each
//! handoff and agent reply, and one final supervisor turn.

use crate::agent::{Agent, Delegation};
use crate::deadline::with_deadline;
use crate::error::AssistantError;
use crate::models::{Conversation, RoutingDecision, Turn};
use crate::oracle::{
    turn_messages, OracleMessage, OracleReply, OracleRequest, ReasoningOracle, ToolSpec,
};
use crate::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const SUPERVISOR: &str = "supervisor";
const HANDOFF_PREFIX: &str = "transfer_to_";
const NO_ANSWER: &str = "I'm sorry, I could not find an answer to your question.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Routing,
    Delegating,
    Finalizing,
}

pub struct Supervisor {
    oracle: Arc<dyn ReasoningOracle>,
    agents: Vec<Arc<dyn Agent>>,
    max_delegations: u32,
    oracle_timeout: Duration,
}

impl Supervisor {
    pub fn new(
        oracle: Arc<dyn ReasoningOracle>,
        agents: Vec<Arc<dyn Agent>>,
        max_delegations: u32,
        oracle_timeout: Duration,
    ) -> Self {
        Self {
            oracle,
            agents,
            max_delegations,
            oracle_timeout,
        }
    }

    fn system_prompt(&self, state: SupervisorState) -> String {
        let mut prompt = String::from(
            "You are a supervisor managing a team of stock market agents. \
             Decide which agent should handle the user's request, or answer directly when no \
             lookup is needed. You may call more than one agent, one at a time. \
             When the agents have answered, reply with one concise answer that combines their \
             findings and is suitable for being read aloud.\n\nAgents:",
        );
        for agent in &self.agents {
            prompt.push_str(&format!("\n- {}: {}", agent.name(), agent.description()));
        }
        if state == SupervisorState::Finalizing {
            prompt.push_str(
                "\n\nNo more agents can be called. Answer now using the replies above.",
            );
        }
        prompt
    }

    fn handoff_tools(&self) -> Vec<ToolSpec> {
        self.agents
            .iter()
            .map(|agent| ToolSpec {
                name: format!("{}{}", HANDOFF_PREFIX, agent.name()),
                description: format!("Transfer the request to {}. {}", agent.name(), agent.description()),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "task": {
                            "type": "string",
                            "description": "What the agent should do; defaults to the user's latest message"
                        }
                    }
                }),
            })
            .collect()
    }

    fn agent_for(&self, tool_name: &str) -> Option<&Arc<dyn Agent>> {
        let wanted = tool_name.strip_prefix(HANDOFF_PREFIX)?;
        self.agents.iter().find(|agent| agent.name() == wanted)
    }

    /// Run the routing loop and return the full interaction trace
    pub async fn run(&self, conversation: Conversation) -> Result<Conversation> {
        if conversation.is_empty() {
            return Err(AssistantError::InvalidToolInput(
                "conversation must contain at least one turn".to_string(),
            ));
        }

        let start = Instant::now();
        let default_task = conversation
            .latest_user()
            .or_else(|| conversation.turns().last())
            .map(|turn| turn.content.clone())
            .unwrap_or_default();

        let mut messages = turn_messages(conversation.turns());
        let mut trace = conversation;
        let mut state = SupervisorState::Routing;
        let mut delegations: u32 = 0;
        let mut last_agent_reply: Option<String> = None;

        info!(
            turns = trace.len(),
            agents = self.agents.len(),
            "Supervisor: routing"
        );

        loop {
            if delegations >= self.max_delegations {
                state = SupervisorState::Finalizing;
            }
            let finalizing = state == SupervisorState::Finalizing;

            let request = OracleRequest {
                system_prompt: self.system_prompt(state),
                messages: messages.clone(),
                tools: if finalizing { vec![] } else { self.handoff_tools() },
            };

            let reply = with_deadline("oracle", self.oracle_timeout, self.oracle.complete(request))
                .await?;

            let call = match reply {
                OracleReply::ToolCall(call) if !finalizing => call,
                reply => {
                    let decision = respond_with(reply, last_agent_reply.as_deref());
                    info!(
                        %decision,
                        delegations,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Supervisor: finalized"
                    );
                    let answer = decision.answer().unwrap_or(NO_ANSWER).to_string();
                    trace.push(Turn::assistant(SUPERVISOR, answer));
                    return Ok(trace);
                }
            };

            // === DELEGATE ===
            delegations += 1;
            messages.push(OracleMessage::ToolCall(call.clone()));

            let Some(agent) = self.agent_for(&call.name) else {
                warn!(handoff = %call.name, "Supervisor: unknown agent handoff");
                messages.push(OracleMessage::ToolResponse {
                    payload: json!({
                        "status": "error",
                        "message": format!("unknown agent handoff '{}'", call.name),
                    }),
                    name: call.name,
                });
                continue;
            };

            let task = call
                .args
                .get("task")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|task| !task.is_empty())
                .unwrap_or(default_task.as_str())
                .to_string();

            let decision = RoutingDecision::Delegate {
                agent: agent.name().to_string(),
                task: task.clone(),
            };
            state = SupervisorState::Delegating;
            info!(%decision, %task, delegation = delegations, "Supervisor: delegating");

            let delegation = Delegation::new(task.clone()).with_context(trace.turns().to_vec());
            trace.push(Turn::assistant(
                SUPERVISOR,
                format!("Transferring to {}: {}", agent.name(), task),
            ));

            let response = agent.handle(&delegation).await?;
            debug!(
                agent = %response.agent,
                tool_calls = response.tool_calls,
                "Supervisor: agent replied"
            );

            trace.push(Turn::assistant(agent.name(), response.text.clone()));
            messages.push(OracleMessage::ToolResponse {
                name: call.name,
                payload: json!({ "agent": response.agent, "response": response.text }),
            });
            last_agent_reply = Some(response.text);
        }
    }
}

/// Closing step: the oracle's text, else the last agent reply, else [`NO_ANSWER`]
fn respond_with(reply: OracleReply, last_agent_reply: Option<&str>) -> RoutingDecision {
    match reply {
        OracleReply::Text(text) if !text.trim().is_empty() => {
            RoutingDecision::Respond(text.trim().to_string())
        }
        _ => {
            warn!("Supervisor: no usable final answer, using fallback");
            RoutingDecision::Respond(last_agent_reply.unwrap_or(NO_ANSWER).to_string())
        }
    }
}

/// Text of the last Assistant turn of a trace
pub fn final_answer(conversation: &Conversation) -> Option<&str> {
    conversation
        .last_assistant()
        .map(|turn| turn.content.as_str())
}
