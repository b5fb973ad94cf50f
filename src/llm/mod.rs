//! LLM client module - the reasoning engine the agent talks to.
//!
//! The agent only depends on the [`LlmClient`] trait, so the OpenAI-compatible
//! HTTP client can be replaced with a scripted stub in tests.

mod error;
mod openai;

#[cfg(test)]
pub(crate) mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use error::LlmError;
pub use openai::OpenAiClient;

/// Message role in a chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,

    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,

    pub function: FunctionCall,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: function_kind(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Function name and JSON-encoded arguments of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Tool definition advertised to the model (OpenAI function format).
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// The model's answer for one round: either tool calls or final text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

fn function_kind() -> String {
    "function".to_string()
}

/// A chat-completion capable reasoning engine.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the conversation so far and return the model's next action.
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ChatResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_result_message_serializes_in_openai_shape() {
        let msg = ChatMessage::tool_result("call_1", "Result: 4");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"role": "tool", "content": "Result: 4", "tool_call_id": "call_1"})
        );
    }

    #[test]
    fn assistant_without_calls_omits_tool_calls() {
        let msg = ChatMessage::assistant(Some("done".to_string()), Vec::new());
        assert!(msg.tool_calls.is_none());
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"role": "assistant", "content": "done"})
        );
    }

    #[test]
    fn tool_call_defaults_kind_when_missing() {
        let call: ToolCall = serde_json::from_value(json!({
            "id": "call_9",
            "function": {"name": "calculate", "arguments": "{\"expression\":\"1+1\"}"}
        }))
        .unwrap();
        assert_eq!(call.kind, "function");
        assert_eq!(call.function.name, "calculate");
    }
}
