//! Gemini-backed reasoning oracle
//!
//! Maps oracle requests onto Gemini function calling.

use crate::error::AssistantError;
use crate::gemini::{
    Content, FunctionCall, FunctionDeclaration, FunctionResponse, GeminiClient, GeminiRequest,
    GeminiResponse, GenerationConfig, Part, SystemInstruction, ToolDeclarations,
};
use crate::oracle::{OracleMessage, OracleReply, OracleRequest, ReasoningOracle, ToolCall};
use crate::Result;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

pub struct GeminiOracle {
    client: GeminiClient,
}

impl GeminiOracle {
    pub fn new(api_key: String, model: &str, request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: GeminiClient::new(api_key, model, request_timeout)?,
        })
    }
}

#[async_trait]
impl ReasoningOracle for GeminiOracle {
    async fn complete(&self, request: OracleRequest) -> Result<OracleReply> {
        let body = build_request(&request);
        let response = self.client.generate(&body).await?;
        parse_reply(response)
    }
}

fn build_request(request: &OracleRequest) -> GeminiRequest {
    let contents = request
        .messages
        .iter()
        .map(|message| match message {
            OracleMessage::User(text) => Content {
                role: "user".to_string(),
                parts: vec![Part::text(text.clone())],
            },
            OracleMessage::Assistant(text) => Content {
                role: "model".to_string(),
                parts: vec![Part::text(text.clone())],
            },
            OracleMessage::ToolCall(call) => Content {
                role: "model".to_string(),
                parts: vec![Part {
                    function_call: Some(FunctionCall {
                        name: call.name.clone(),
                        args: call.args.clone(),
                    }),
                    ..Default::default()
                }],
            },
            OracleMessage::ToolResponse { name, payload } => Content {
                role: "user".to_string(),
                parts: vec![Part {
                    function_response: Some(FunctionResponse {
                        name: name.clone(),
                        // functionResponse.response must be an object
                        response: if payload.is_object() {
                            payload.clone()
                        } else {
                            json!({ "content": payload })
                        },
                    }),
                    ..Default::default()
                }],
            },
        })
        .collect();

    let tools = if request.tools.is_empty() {
        vec![]
    } else {
        vec![ToolDeclarations {
            function_declarations: request
                .tools
                .iter()
                .map(|tool| FunctionDeclaration {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                })
                .collect(),
        }]
    };

    GeminiRequest {
        contents,
        tools,
        system_instruction: SystemInstruction {
            parts: vec![Part::text(request.system_prompt.clone())],
        },
        generation_config: GenerationConfig::default(),
    }
}

fn parse_reply(response: GeminiResponse) -> Result<OracleReply> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AssistantError::Oracle("No candidates in Gemini response".to_string()))?;

    let content = candidate.content.ok_or_else(|| {
        AssistantError::Oracle(format!(
            "Gemini returned no content (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        ))
    })?;

    let mut text = String::new();
    for part in content.parts {
        if let Some(call) = part.function_call {
            return Ok(OracleReply::ToolCall(ToolCall {
                name: call.name,
                args: call.args,
            }));
        }
        if let Some(fragment) = part.text {
            text.push_str(&fragment);
        }
    }

    if text.trim().is_empty() {
        warn!("Gemini returned an empty text reply");
    }

    Ok(OracleReply::Text(text.trim().to_string()))
}
