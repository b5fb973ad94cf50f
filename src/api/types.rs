//! API request and response types.

use serde::{Deserialize, Serialize};

/// Request to run the agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentRequest {
    /// The user prompt
    pub prompt: String,
}

/// The agent's final answer.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse {
    pub response: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service name
    pub service: String,
}

/// Error body for rejected requests.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}
