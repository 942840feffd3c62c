//! Reasoning oracle trait and implementations
//!
//! The oracle is the black-box model consulted by agents and the supervisor.
//! It sees a system prompt, a message history and a set of callable tools,
//! and answers either with text or with a single tool call.

use crate::error::AssistantError;
use crate::models::{Role, Turn};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use tokio::sync::Mutex;

pub mod gemini;
pub use gemini::GeminiOracle;

/// Tool the oracle may call
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OracleMessage {
    User(String),
    Assistant(String),
    ToolCall(ToolCall),
    ToolResponse { name: String, payload: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    pub system_prompt: String,
    pub messages: Vec<OracleMessage>,
    /// Empty means the oracle must answer in text
    pub tools: Vec<ToolSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OracleReply {
    Text(String),
    ToolCall(ToolCall),
}

impl OracleReply {
    pub fn text(text: impl Into<String>) -> Self {
        OracleReply::Text(text.into())
    }

    pub fn tool_call(name: impl Into<String>, args: Value) -> Self {
        OracleReply::ToolCall(ToolCall {
            name: name.into(),
            args,
        })
    }
}

/// Conversation turns as oracle messages. Assistant turns keep their speaker as a prefix.
pub fn turn_messages(turns: &[Turn]) -> Vec<OracleMessage> {
    turns
        .iter()
        .map(|turn| match (turn.role, turn.name.as_deref()) {
            (Role::User, _) => OracleMessage::User(turn.content.clone()),
            (Role::Assistant, Some(name)) => {
                OracleMessage::Assistant(format!("{}: {}", name, turn.content))
            }
            (Role::Assistant, None) => OracleMessage::Assistant(turn.content.clone()),
        })
        .collect()
}

#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    async fn complete(&self, request: OracleRequest) -> Result<OracleReply>;
}

/// One scripted oracle behavior
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Reply(OracleReply),
    Fail(String),
    /// Never answers; exercises deadlines
    Hang,
}

/// Deterministic oracle for development & testing.
/// Replays a fixed script and records every request it receives.
pub struct ScriptedOracle {
    script: Mutex<VecDeque<ScriptStep>>,
    requests: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Script made only of replies
    pub fn replies(replies: Vec<OracleReply>) -> Self {
        Self::new(replies.into_iter().map(ScriptStep::Reply).collect())
    }

    pub async fn requests(&self) -> Vec<OracleRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl ReasoningOracle for ScriptedOracle {
    async fn complete(&self, request: OracleRequest) -> Result<OracleReply> {
        self.requests.lock().await.push(request);
        let step = self.script.lock().await.pop_front();

        match step {
            Some(ScriptStep::Reply(reply)) => Ok(reply),
            Some(ScriptStep::Fail(message)) => Err(AssistantError::Oracle(message)),
            Some(ScriptStep::Hang) => std::future::pending::<Result<OracleReply>>().await,
            None => Err(AssistantError::Oracle("oracle script exhausted".to_string())),
        }
    }
}
