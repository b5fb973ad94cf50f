//! Agent module - the tool-calling loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Seed the conversation with the system prompt and user prompt
//! 2. Call the LLM with the available tools
//! 3. If the LLM requests tool calls, execute them and feed the results back
//! 4. Repeat until the LLM produces a final answer or the round limit is hit

mod agent_loop;
mod conversation;
mod error;
mod prompt;

pub use agent_loop::{Agent, AgentRun, ToolExecution};
pub use conversation::Conversation;
pub use error::AgentError;
pub use prompt::build_system_prompt;
