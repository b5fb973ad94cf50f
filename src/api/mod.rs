//! HTTP API for the utility agent.
//!
//! ## Endpoints
//!
//! - `GET /` - Minimal web page for trying prompts
//! - `GET /health` - Health check
//! - `POST /agent` - Run the agent on `{"prompt": "..."}`

mod routes;
pub mod types;

pub use routes::{router, serve, AppState};
