//! # Utility Agent
//!
//! An HTTP service that answers prompts with a tool-calling LLM agent.
//!
//! This library provides:
//! - An HTTP API (`POST /agent`) for running prompts
//! - A tool-based agent loop with a bounded number of rounds
//! - Five stateless utility tools: calculator, text statistics, JSON
//!   formatting, current time and case conversion
//! - An OpenAI-compatible chat completions client
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Receive a prompt via the API
//! 2. Build a conversation with the system prompt and available tools
//! 3. Call the LLM, execute any tool calls it requests
//! 4. Feed results back to the LLM, repeat until it answers
//!
//! ## Example
//!
//! ```rust,ignore
//! use utility_agent::{agent::Agent, config::Config};
//!
//! let config = Config::from_env()?;
//! let agent = Agent::new(&config)?;
//! let answer = agent.run("Calculate 25 * 48 + sqrt(144)").await;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod tools;

pub use config::Config;
