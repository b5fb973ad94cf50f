//! Agent run errors.

use thiserror::Error;

use crate::llm::LlmError;

/// Failures that end an agent run without a final answer.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Round limit ({limit}) reached without a final answer")]
    RoundLimitExceeded { limit: usize },

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error(transparent)]
    Llm(#[from] LlmError),
}
