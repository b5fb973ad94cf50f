//! Message history for a single request.

use crate::llm::{ChatMessage, ToolCall};

/// Ordered messages exchanged during one agent run.
///
/// Created fresh for every request and dropped when the run ends.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_prompt),
            ],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn push_assistant(&mut self, content: Option<String>, tool_calls: Vec<ToolCall>) {
        self.messages.push(ChatMessage::assistant(content, tool_calls));
    }

    pub fn push_tool_result(&mut self, tool_call_id: &str, output: String) {
        self.messages.push(ChatMessage::tool_result(tool_call_id, output));
    }
}
