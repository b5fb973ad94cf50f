//! LLM client errors.

use thiserror::Error;

/// Failures talking to the reasoning engine.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from LLM: {0}")]
    InvalidResponse(String),
}
