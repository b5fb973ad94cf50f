//! Tool library exposed to the agent.
//!
//! Every tool is stateless. Failures are reported as text starting with
//! `Error` so the model can read them like any other tool output; nothing
//! escapes [`ToolRegistry::execute`] as a fault.

mod calculator;
mod case;
mod datetime;
mod expr;
mod json;
mod text;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::{FunctionDefinition, ToolDefinition};

pub use calculator::{calculate, Calculate};
pub use case::{convert_case, ConvertCase};
pub use datetime::{get_current_datetime, GetCurrentDatetime};
pub use json::{format_json, FormatJson};
pub use text::{analyze_text, AnalyzeText};

/// A tool the model may call mid-conversation.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses to call the tool.
    fn name(&self) -> &str;

    /// Human readable description shown to the model.
    fn description(&self) -> &str;

    /// JSON Schema of the arguments object.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. `Err` is reserved for malformed arguments.
    async fn execute(&self, args: Value) -> anyhow::Result<String>;
}

/// Name and description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Registry of the available tools, in registration order.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Registry with the five utility tools.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(Calculate));
        registry.register(Arc::new(AnalyzeText));
        registry.register(Arc::new(FormatJson));
        registry.register(Arc::new(GetCurrentDatetime));
        registry.register(Arc::new(ConvertCase));
        registry
    }

    pub fn empty() -> Self {
        Self {
            tools: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Add a tool, replacing any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        match self.by_name.get(&name) {
            Some(&idx) => self.tools[idx] = tool,
            None => {
                self.by_name.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Function definitions in the format the chat completions API expects.
    pub fn get_tool_schemas(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                kind: "function".to_string(),
                function: FunctionDefinition {
                    name: t.name().to_string(),
                    description: t.description().to_string(),
                    parameters: t.parameters_schema(),
                },
            })
            .collect()
    }

    /// Execute a tool by name. Always yields text.
    pub async fn execute(&self, name: &str, args: Value) -> String {
        let Some(tool) = self.by_name.get(name).map(|&idx| &self.tools[idx]) else {
            tracing::warn!("Model requested unknown tool: {}", name);
            return format!("Error: Unknown tool: {}", name);
        };

        match tool.execute(args).await {
            Ok(output) => output,
            Err(e) => format!("Error: {}", e),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch a required string argument.
pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> anyhow::Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' argument", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_exposes_all_five_tools_in_order() {
        let names: Vec<String> = ToolRegistry::new()
            .list_tools()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "calculate",
                "analyze_text",
                "format_json",
                "get_current_datetime",
                "convert_case"
            ]
        );
    }

    #[test]
    fn schemas_are_function_definitions() {
        let schemas = ToolRegistry::new().get_tool_schemas();
        assert_eq!(schemas.len(), 5);
        let convert = schemas
            .iter()
            .find(|s| s.function.name == "convert_case")
            .unwrap();
        assert_eq!(convert.kind, "function");
        assert_eq!(
            convert.function.parameters["required"],
            json!(["text", "case_type"])
        );
    }

    #[test]
    fn execute_dispatches_by_name() {
        let registry = ToolRegistry::new();
        let out = tokio_test::block_on(
            registry.execute("calculate", json!({"expression": "2 + 2"})),
        );
        assert_eq!(out, "Result: 4");
    }

    #[test]
    fn unknown_tool_is_reported_as_text() {
        let registry = ToolRegistry::new();
        let out = tokio_test::block_on(registry.execute("rm_rf", json!({})));
        assert_eq!(out, "Error: Unknown tool: rm_rf");
    }

    #[test]
    fn missing_argument_is_reported_as_text() {
        let registry = ToolRegistry::new();
        let out = tokio_test::block_on(registry.execute("convert_case", json!({"text": "x"})));
        assert_eq!(out, "Error: Missing 'case_type' argument");
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Calculate));
        assert_eq!(registry.list_tools().len(), 5);
    }
}
