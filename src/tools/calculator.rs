//! Arithmetic calculator tool.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::expr::{evaluate, EvalError};
use super::{required_str, Tool};

const BLOCKED_KEYWORDS: &[&str] = &["import", "exec", "eval", "__"];

/// Evaluate an arithmetic expression.
///
/// The grammar only admits numbers, `+ - * / // % **`, parentheses and the
/// whitelisted math names, so nothing else can ever run. The keyword check
/// is kept so such inputs get the same short rejection the model is used to.
pub fn calculate(expression: &str) -> String {
    let lowered = expression.to_lowercase();
    if BLOCKED_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        tracing::warn!("Rejected blocked expression: {}", expression);
        return "Error: Invalid expression".to_string();
    }

    match evaluate(expression) {
        Ok(value) => format!("Result: {}", value),
        Err(EvalError::DivisionByZero) => "Error: Division by zero".to_string(),
        Err(e) => format!("Error calculating expression: {}", e),
    }
}

pub struct Calculate;

#[async_trait]
impl Tool for Calculate {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Calculate a mathematical expression. Supports basic arithmetic: +, -, *, /, **, (), and common functions like sqrt, abs, round, min, max, pow, sin, cos, tan, log, log10, ceil, floor and the constants pi and e. Example: \"2 + 2\", \"sqrt(16)\", \"10 ** 2\""
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "The arithmetic expression to evaluate"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let expression = required_str(&args, "expression")?;
        Ok(calculate(expression))
    }
}
