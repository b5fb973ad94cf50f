//! JSON validation and pretty-printing tool.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{required_str, Tool};

/// Parse `input` as JSON and re-render it with 2-space indentation.
///
/// Object keys keep their input order and non-ASCII text is written as-is.
pub fn format_json(input: &str) -> String {
    let parsed: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(e) => return format!("Error: Invalid JSON - {}", e),
    };

    match serde_json::to_string_pretty(&parsed) {
        Ok(formatted) => format!("Formatted JSON:\n{}", formatted),
        Err(e) => format!("Error formatting JSON: {}", e),
    }
}

pub struct FormatJson;

#[async_trait]
impl Tool for FormatJson {
    fn name(&self) -> &str {
        "format_json"
    }

    fn description(&self) -> &str {
        "Format and validate a JSON string. Returns prettified JSON or error message."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "json_string": {
                    "type": "string",
                    "description": "The JSON text to format"
                }
            },
            "required": ["json_string"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let input = required_str(&args, "json_string")?;
        Ok(format_json(input))
    }
}
