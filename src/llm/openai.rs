//! OpenAI-compatible chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, ChatResponse, LlmClient, LlmError, ToolCall, ToolDefinition};

/// Client for `POST {base_url}/chat/completions`.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    temperature: f32,
}

impl OpenAiClient {
    /// Build a client. `timeout` of `None` leaves requests unbounded.
    pub fn new(
        api_key: String,
        base_url: String,
        temperature: f32,
        timeout: Option<Duration>,
    ) -> Result<Self, LlmError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

impl CompletionResponse {
    fn into_chat_response(self) -> Result<ChatResponse, LlmError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        Ok(ChatResponse {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ChatResponse, LlmError> {
        let body = CompletionRequest {
            model,
            messages,
            tools: tools.filter(|t| !t.is_empty()),
            temperature: self.temperature,
        };

        tracing::debug!(
            "Sending {} messages to {} ({})",
            messages.len(),
            self.completions_url(),
            model
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!("LLM API returned {}: {}", status, message);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        parsed.into_chat_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_omits_empty_tool_list() {
        let messages = vec![ChatMessage::user("hi")];
        let body = CompletionRequest {
            model: "gpt-5-nano",
            messages: &messages,
            tools: None,
            temperature: 0.0,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "gpt-5-nano",
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.0
            })
        );
    }

    #[test]
    fn response_with_tool_calls_is_parsed() {
        let parsed: CompletionResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "calculate", "arguments": "{\"expression\": \"2+2\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();

        let response = parsed.into_chat_response().unwrap();
        assert!(response.content.is_none());
        let calls = response.tool_calls.unwrap();
        assert_eq!(calls[0].id, "call_abc");
        assert_eq!(calls[0].function.name, "calculate");
    }

    #[test]
    fn response_without_choices_is_invalid() {
        let parsed: CompletionResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(
            parsed.into_chat_response(),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = OpenAiClient::new(
            "sk-test".to_string(),
            "http://localhost:11434/v1/".to_string(),
            0.0,
            None,
        )
        .unwrap();
        assert_eq!(
            client.completions_url(),
            "http://localhost:11434/v1/chat/completions"
        );
    }
}
