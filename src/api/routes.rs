//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use super::types::{AgentRequest, AgentResponse, ErrorResponse, HealthResponse};
use crate::agent::Agent;
use crate::config::Config;

const SERVICE_NAME: &str = "AI Utility Agent";
const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Shared application state.
pub struct AppState {
    pub agent: Agent,
}

/// Build the router with tracing and CORS layers.
pub fn router(state: Arc<AppState>, cors_allow_any_origin: bool) -> Router {
    let cors = if cors_allow_any_origin {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/agent", post(invoke_agent))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and run until ctrl-c.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let agent = Agent::new(&config)?;
    tracing::info!("Agent ready: model={}", agent.model());
    let state = Arc::new(AppState { agent });
    let app = router(state, config.cors_allow_any_origin);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// GET / - Prompt form.
async fn home() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health - Health check.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

/// POST /agent - Run the agent on a prompt.
async fn invoke_agent(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AgentRequest>,
) -> Result<Json<AgentResponse>, (StatusCode, Json<ErrorResponse>)> {
    if req.prompt.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                detail: "Prompt cannot be empty".to_string(),
            }),
        ));
    }

    let span = tracing::info_span!("agent_request", request_id = %Uuid::new_v4());
    let response = async {
        let preview: String = req.prompt.chars().take(100).collect();
        tracing::info!("Processing request: {}...", preview);

        let response = state.agent.run(&req.prompt).await;

        tracing::info!("Request processed");
        response
    }
    .instrument(span)
    .await;

    Ok(Json(AgentResponse { response }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::scripted::ScriptedClient;
    use crate::tools::ToolRegistry;
    use serde_json::json;

    fn state_with(client: Arc<ScriptedClient>) -> Arc<AppState> {
        Arc::new(AppState {
            agent: Agent::with_client(
                client,
                ToolRegistry::new(),
                "test-model".to_string(),
                50,
            ),
        })
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected_before_the_agent_runs() {
        let client = Arc::new(ScriptedClient::default());
        let state = state_with(client.clone());

        for prompt in ["", "   \n\t"] {
            let err = invoke_agent(
                State(state.clone()),
                Json(AgentRequest {
                    prompt: prompt.to_string(),
                }),
            )
            .await
            .unwrap_err();

            assert_eq!(err.0, StatusCode::BAD_REQUEST);
            assert_eq!(err.1.detail, "Prompt cannot be empty");
        }
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn prompt_runs_through_the_agent() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(ScriptedClient::tool_call(
                "call_1",
                "calculate",
                json!({"expression": "25 * 48 + sqrt(144)"}),
            )),
            Ok(ScriptedClient::final_text("The result is 1212.")),
        ]));
        let state = state_with(client.clone());

        let Json(body) = invoke_agent(
            State(state),
            Json(AgentRequest {
                prompt: "Calculate 25 * 48 + sqrt(144)".to_string(),
            }),
        )
        .await
        .expect("handler succeeds");

        assert_eq!(body.response, "The result is 1212.");
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn agent_failures_are_returned_as_text() {
        let client = Arc::new(ScriptedClient::new(Vec::new()));
        let state = state_with(client);

        let Json(body) = invoke_agent(
            State(state),
            Json(AgentRequest {
                prompt: "hi".to_string(),
            }),
        )
        .await
        .expect("handler succeeds");

        assert_eq!(
            body.response,
            "Error: Invalid response from LLM: script exhausted"
        );
    }

    #[tokio::test]
    async fn health_reports_service_name() {
        let Json(body) = health().await;
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"status": "healthy", "service": "AI Utility Agent"})
        );
    }

    #[tokio::test]
    async fn router_builds_with_both_cors_modes() {
        let state = state_with(Arc::new(ScriptedClient::default()));
        let _ = router(state.clone(), true);
        let _ = router(state, false);
    }

    #[test]
    fn index_page_posts_to_agent() {
        assert!(INDEX_HTML.contains("/agent"));
    }
}
