//! Scripted reasoning engine used by tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatMessage, ChatResponse, LlmClient, LlmError, ToolCall, ToolDefinition};

/// Replays a fixed list of responses and records every conversation it sees.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    responses: Mutex<VecDeque<Result<ChatResponse, LlmError>>>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
    fixed: Option<ChatResponse>,
}

impl ScriptedClient {
    pub(crate) fn new(responses: Vec<Result<ChatResponse, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    /// Answers every round with the same response.
    pub(crate) fn always(response: ChatResponse) -> Self {
        Self {
            fixed: Some(response),
            ..Self::default()
        }
    }

    pub(crate) fn final_text(text: &str) -> ChatResponse {
        ChatResponse {
            content: Some(text.to_string()),
            tool_calls: None,
        }
    }

    pub(crate) fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> ChatResponse {
        ChatResponse {
            content: None,
            tool_calls: Some(vec![ToolCall::new(id, name, arguments.to_string())]),
        }
    }

    /// Conversation snapshots, one per round.
    pub(crate) fn conversations(&self) -> Vec<Vec<ChatMessage>> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn chat_completion(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        _tools: Option<&[ToolDefinition]>,
    ) -> Result<ChatResponse, LlmError> {
        self.seen.lock().unwrap().push(messages.to_vec());

        if let Some(response) = &self.fixed {
            return Ok(response.clone());
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("script exhausted".to_string())))
    }
}
