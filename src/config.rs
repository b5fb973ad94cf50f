//! Configuration management for the utility agent.
//!
//! Configuration can be set via environment variables:
//! - `OPENAI_API_KEY` - Required. API key for the OpenAI-compatible endpoint.
//! - `OPENAI_BASE_URL` - Optional. Defaults to `https://api.openai.com/v1`.
//! - `DEFAULT_MODEL` - Optional. The LLM model to use. Defaults to `gpt-5-nano`.
//! - `TEMPERATURE` - Optional. Sampling temperature. Defaults to `0`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `MAX_ITERATIONS` - Optional. Maximum agent loop rounds. Defaults to `50`.
//! - `LLM_TIMEOUT_SECS` - Optional. Per-request timeout for LLM calls. Unset means no timeout.
//! - `CORS_ALLOW_ANY_ORIGIN` - Optional. Allow cross-origin requests from anywhere. Defaults to `true`.

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-5-nano";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the reasoning engine
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API
    pub base_url: String,

    /// Model identifier
    pub default_model: String,

    /// Sampling temperature sent with every completion request
    pub temperature: f32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum rounds for the agent loop
    pub max_iterations: usize,

    /// Optional timeout applied to each LLM request
    pub llm_timeout: Option<Duration>,

    /// Whether to answer CORS preflights for any origin
    pub cors_allow_any_origin: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENAI_API_KEY` is not set, and
    /// `ConfigError::InvalidValue` when an optional variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let default_model =
            std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let temperature = parse_env("TEMPERATURE", "0")?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = parse_env("PORT", "8000")?;

        let max_iterations: usize = parse_env("MAX_ITERATIONS", "50")?;
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let llm_timeout = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .map(|v| {
                v.trim().parse::<u64>().map_err(|e| {
                    ConfigError::InvalidValue("LLM_TIMEOUT_SECS".to_string(), e.to_string())
                })
            })
            .transpose()?
            .map(Duration::from_secs);

        let cors_allow_any_origin = std::env::var("CORS_ALLOW_ANY_ORIGIN")
            .ok()
            .map(|v| {
                parse_bool(&v)
                    .map_err(|e| ConfigError::InvalidValue("CORS_ALLOW_ANY_ORIGIN".to_string(), e))
            })
            .transpose()?
            .unwrap_or(true);

        Ok(Self {
            api_key,
            base_url,
            default_model,
            temperature,
            host,
            port,
            max_iterations,
            llm_timeout,
            cors_allow_any_origin,
        })
    }

    /// Create a config with default values (useful for testing).
    pub fn new(api_key: String, default_model: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model,
            temperature: 0.0,
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_iterations: 50,
            llm_timeout: None,
            cors_allow_any_origin: true,
        }
    }
}

fn parse_env<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    parse_value(name, &raw)
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}
