//! Gemini API client
//!
//! Thin wrapper over `generateContent` with function-calling support.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::error::AssistantError;
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: &str, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/{}:generateContent", BASE_URL, model),
        })
    }

    pub async fn generate(&self, request: &GeminiRequest) -> Result<GeminiResponse> {
        if self.api_key.is_empty() {
            return Err(AssistantError::Oracle(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        debug!(
            contents = request.contents.len(),
            tools = request.tools.len(),
            "Calling Gemini API"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                AssistantError::Oracle(format!("Gemini API request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(AssistantError::Oracle(format!(
                "Gemini API returned {}",
                status
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            AssistantError::Oracle(format!("Gemini parse error: {}", e))
        })?;

        if let Some(usage) = &gemini_response.usage_metadata {
            info!(
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                "Gemini response received"
            );
        }

        Ok(gemini_response)
    }
}

//
// ================= Wire Types =================
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDeclarations>,
    pub system_instruction: SystemInstruction,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDeclarations {
    pub function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: i32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_output_tokens: 1024,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: i32,
    #[serde(default)]
    pub candidates_token_count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = GeminiRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part::text("AAPL stock price today")],
            }],
            tools: vec![ToolDeclarations {
                function_declarations: vec![FunctionDeclaration {
                    name: "search_duckduckgo".to_string(),
                    description: "Search".to_string(),
                    parameters: json!({ "type": "object" }),
                }],
            }],
            system_instruction: SystemInstruction {
                parts: vec![Part::text("You are a search agent")],
            },
            generation_config: GenerationConfig::default(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "AAPL stock price today");
        assert!(json["contents"][0]["parts"][0].get("functionCall").is_none());
        assert_eq!(
            json["tools"][0]["functionDeclarations"][0]["name"],
            "search_duckduckgo"
        );
        assert_eq!(json["generationConfig"]["temperature"], 0.0);
    }

    #[test]
    fn test_tools_omitted_when_empty() {
        let request = GeminiRequest {
            contents: vec![],
            tools: vec![],
            system_instruction: SystemInstruction { parts: vec![] },
            generation_config: GenerationConfig::default(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn test_function_call_response_parsing() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{
                        "functionCall": {
                            "name": "fetch_stock_history",
                            "args": { "ticker": "AAPL", "start_date": "2024-01-01", "end_date": "2024-03-01" }
                        }
                    }]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 120, "candidatesTokenCount": 18 }
        });

        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        let part = &response.candidates[0].content.as_ref().unwrap().parts[0];
        let call = part.function_call.as_ref().unwrap();
        assert_eq!(call.name, "fetch_stock_history");
        assert_eq!(call.args["ticker"], "AAPL");
        assert_eq!(response.usage_metadata.unwrap().prompt_token_count, 120);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_oracle_error() {
        let client =
            GeminiClient::new(String::new(), "gemini-1.5-flash", Duration::from_secs(5)).unwrap();
        let request = GeminiRequest {
            contents: vec![],
            tools: vec![],
            system_instruction: SystemInstruction { parts: vec![] },
            generation_config: GenerationConfig::default(),
        };
        let result = client.generate(&request).await;
        assert!(matches!(result, Err(AssistantError::Oracle(_))));
    }
}
