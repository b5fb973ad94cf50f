//! Core agent loop implementation.

use std::sync::Arc;

use crate::config::Config;
use crate::llm::{LlmClient, LlmError, OpenAiClient, ToolCall};
use crate::tools::ToolRegistry;

use super::conversation::Conversation;
use super::error::AgentError;
use super::prompt::build_system_prompt;

/// The tool-calling agent.
///
/// Holds no per-request state, so one instance serves concurrent requests.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    model: String,
    max_iterations: usize,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct AgentRun {
    /// Final answer text
    pub response: String,

    /// Number of LLM rounds used
    pub rounds: usize,

    /// Tool calls executed, in order
    pub tool_calls: Vec<ToolExecution>,
}

/// A single tool invocation made during a run.
#[derive(Debug, Clone)]
pub struct ToolExecution {
    pub name: String,
    pub arguments: String,
    pub output: String,
}

impl Agent {
    /// Create an agent backed by the OpenAI-compatible API from `config`.
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        let llm = OpenAiClient::new(
            config.api_key.clone(),
            config.base_url.clone(),
            config.temperature,
            config.llm_timeout,
        )?;

        Ok(Self::with_client(
            Arc::new(llm),
            ToolRegistry::new(),
            config.default_model.clone(),
            config.max_iterations,
        ))
    }

    /// Create an agent around an existing reasoning engine.
    pub fn with_client(
        llm: Arc<dyn LlmClient>,
        tools: ToolRegistry,
        model: String,
        max_iterations: usize,
    ) -> Self {
        Self {
            llm,
            tools,
            model,
            max_iterations,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run a prompt and return the final answer text.
    ///
    /// Never fails: any loop or transport error is rendered as `Error: <message>`.
    pub async fn run(&self, prompt: &str) -> String {
        match self.run_task(prompt).await {
            Ok(run) => {
                tracing::info!(
                    "Agent finished in {} rounds with {} tool calls",
                    run.rounds,
                    run.tool_calls.len()
                );
                for execution in &run.tool_calls {
                    tracing::debug!(
                        "  {}({}) -> {}",
                        execution.name,
                        truncate_for_log(&execution.arguments, 200),
                        truncate_for_log(&execution.output, 200)
                    );
                }
                run.response
            }
            Err(e) => {
                tracing::error!("Agent run failed: {}", e);
                format!("Error: {}", e)
            }
        }
    }

    /// Drive the tool-calling loop until the model gives a final answer.
    pub async fn run_task(&self, prompt: &str) -> Result<AgentRun, AgentError> {
        let system_prompt = build_system_prompt(&self.tools);
        let mut conversation = Conversation::new(system_prompt, prompt);
        let tool_schemas = self.tools.get_tool_schemas();
        let mut executions = Vec::new();

        for round in 1..=self.max_iterations {
            tracing::debug!("Agent round {} ({} messages)", round, conversation.len());

            let response = self
                .llm
                .chat_completion(
                    &self.model,
                    conversation.messages(),
                    Some(tool_schemas.as_slice()),
                )
                .await?;

            let tool_calls = response.tool_calls.unwrap_or_default();
            if !tool_calls.is_empty() {
                conversation.push_assistant(response.content, tool_calls.clone());

                for tool_call in &tool_calls {
                    let output = self.execute_tool_call(tool_call).await;
                    tracing::debug!(
                        "Tool {} returned: {}",
                        tool_call.function.name,
                        truncate_for_log(&output, 200)
                    );

                    conversation.push_tool_result(&tool_call.id, output.clone());
                    executions.push(ToolExecution {
                        name: tool_call.function.name.clone(),
                        arguments: tool_call.function.arguments.clone(),
                        output,
                    });
                }

                continue;
            }

            return match response.content {
                Some(content) => Ok(AgentRun {
                    response: content,
                    rounds: round,
                    tool_calls: executions,
                }),
                None => Err(AgentError::EmptyResponse),
            };
        }

        Err(AgentError::RoundLimitExceeded {
            limit: self.max_iterations,
        })
    }

    /// Execute a single tool call, always producing text for the model.
    async fn execute_tool_call(&self, tool_call: &ToolCall) -> String {
        tracing::info!(
            "Calling tool: {} with args: {}",
            tool_call.function.name,
            tool_call.function.arguments
        );

        let raw = tool_call.function.arguments.trim();
        let args = if raw.is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            match serde_json::from_str(raw) {
                Ok(args) => args,
                Err(e) => return format!("Error: Invalid tool arguments: {}", e),
            }
        };

        self.tools.execute(&tool_call.function.name, args).await
    }
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}... [truncated]", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::scripted::ScriptedClient;
    use crate::llm::{ChatResponse, Role};
    use serde_json::json;

    fn agent_with(client: Arc<ScriptedClient>, max_iterations: usize) -> Agent {
        Agent::with_client(
            client,
            ToolRegistry::new(),
            "test-model".to_string(),
            max_iterations,
        )
    }

    #[tokio::test]
    async fn single_calculation_round_trip() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(ScriptedClient::tool_call(
                "call_1",
                "calculate",
                json!({"expression": "25 * 48 + sqrt(144)"}),
            )),
            Ok(ScriptedClient::final_text("25 * 48 + sqrt(144) = 1212")),
        ]));
        let agent = agent_with(client.clone(), 50);

        let run = agent
            .run_task("Calculate 25 * 48 + sqrt(144)")
            .await
            .expect("run succeeds");

        assert!(run.response.contains("1212"));
        assert_eq!(run.rounds, 2);
        assert_eq!(run.tool_calls.len(), 1);
        assert_eq!(run.tool_calls[0].name, "calculate");
        assert_eq!(
            run.tool_calls[0].arguments,
            r#"{"expression":"25 * 48 + sqrt(144)"}"#
        );
        assert_eq!(run.tool_calls[0].output, "Result: 1212.0");

        // The second round sees the tool result keyed by the call id.
        let conversations = client.conversations();
        assert_eq!(conversations.len(), 2);
        let second = &conversations[1];
        assert_eq!(second.len(), 4);
        assert_eq!(second[2].role, Role::Assistant);
        assert_eq!(second[3].role, Role::Tool);
        assert_eq!(second[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(second[3].content.as_deref(), Some("Result: 1212.0"));
    }

    #[tokio::test]
    async fn answers_without_tools_in_one_round() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(ScriptedClient::final_text(
            "Hello!",
        ))]));
        let agent = agent_with(client.clone(), 50);

        let run = agent.run_task("hi").await.unwrap();
        assert_eq!(run.response, "Hello!");
        assert_eq!(run.rounds, 1);
        assert!(run.tool_calls.is_empty());

        let first = &client.conversations()[0];
        assert_eq!(first[0].role, Role::System);
        assert_eq!(first[1].content.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn executes_every_call_in_a_round_in_order() {
        let both = ChatResponse {
            content: None,
            tool_calls: Some(vec![
                ToolCall::new("a", "convert_case", r#"{"text":"hello world","case_type":"camel"}"#),
                ToolCall::new("b", "calculate", r#"{"expression":"1/0"}"#),
            ]),
        };
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(both),
            Ok(ScriptedClient::final_text("done")),
        ]));
        let agent = agent_with(client.clone(), 50);

        let run = agent.run_task("two things").await.unwrap();
        let outputs: Vec<&str> = run.tool_calls.iter().map(|t| t.output.as_str()).collect();
        assert_eq!(outputs, vec!["helloWorld", "Error: Division by zero"]);

        let second = &client.conversations()[1];
        assert_eq!(second[3].tool_call_id.as_deref(), Some("a"));
        assert_eq!(second[4].tool_call_id.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn tool_faults_are_fed_back_not_raised() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(ScriptedClient::tool_call("c1", "delete_everything", json!({}))),
            Ok(ChatResponse {
                content: None,
                tool_calls: Some(vec![ToolCall::new("c2", "calculate", "not json")]),
            }),
            Ok(ScriptedClient::final_text("gave up")),
        ]));
        let agent = agent_with(client, 50);

        let run = agent.run_task("break things").await.unwrap();
        assert_eq!(run.response, "gave up");
        assert_eq!(run.tool_calls[0].output, "Error: Unknown tool: delete_everything");
        assert!(run.tool_calls[1]
            .output
            .starts_with("Error: Invalid tool arguments: "));
    }

    #[tokio::test]
    async fn round_limit_is_a_distinct_error() {
        let client = Arc::new(ScriptedClient::always(ScriptedClient::tool_call(
            "loop",
            "get_current_datetime",
            json!({}),
        )));
        let agent = agent_with(client.clone(), 3);

        let err = agent.run_task("forever").await.unwrap_err();
        assert!(matches!(err, AgentError::RoundLimitExceeded { limit: 3 }));
        assert_eq!(client.calls(), 3);

        assert_eq!(
            agent.run("forever").await,
            "Error: Round limit (3) reached without a final answer"
        );
    }

    #[tokio::test]
    async fn llm_failures_become_error_text() {
        let client = Arc::new(ScriptedClient::new(vec![Err(LlmError::Api {
            status: 401,
            message: "bad key".to_string(),
        })]));
        let agent = agent_with(client, 50);

        assert_eq!(agent.run("hi").await, "Error: API error (401): bad key");
    }

    #[tokio::test]
    async fn empty_response_is_an_error() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(ChatResponse::default())]));
        let agent = agent_with(client, 50);

        assert!(matches!(
            agent.run_task("hi").await,
            Err(AgentError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn every_run_starts_a_fresh_conversation() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(ScriptedClient::final_text("one")),
            Ok(ScriptedClient::final_text("two")),
        ]));
        let agent = agent_with(client.clone(), 50);

        assert_eq!(agent.run("first").await, "one");
        assert_eq!(agent.run("second").await, "two");

        let conversations = client.conversations();
        assert_eq!(conversations[1].len(), 2);
        assert_eq!(conversations[1][1].content.as_deref(), Some("second"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_for_log("héllo", 2), "hé... [truncated]");
        assert_eq!(truncate_for_log("short", 10), "short");
    }
}
