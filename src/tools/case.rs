//! Case conversion tool.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};

use super::{required_str, Tool};

static UPPER_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("valid regex"));
static LOWER_THEN_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));
static NON_ALNUM_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("valid regex"));

const CASE_TYPES: &str = "upper, lower, title, capitalize, snake, camel, or kebab";

/// Convert `text` to the case named by `case_type` (case-insensitive).
pub fn convert_case(text: &str, case_type: &str) -> String {
    let case_type = case_type.to_lowercase();
    match case_type.as_str() {
        "upper" => text.to_uppercase(),
        "lower" => text.to_lowercase(),
        "title" => title_case(text),
        "capitalize" => capitalize(text),
        "snake" => snake_case(text),
        "camel" => match camel_case(text) {
            Some(converted) => converted,
            None => "Error converting case: no words to convert".to_string(),
        },
        "kebab" => NON_ALNUM_RUN.replace_all(text, "-").to_lowercase(),
        other => format!("Error: Unknown case type '{}'. Use: {}", other, CASE_TYPES),
    }
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&chars.as_str().to_lowercase());
            out
        }
        None => String::new(),
    }
}

fn snake_case(text: &str) -> String {
    let split = UPPER_WORD.replace_all(text, "${1}_${2}");
    LOWER_THEN_UPPER
        .replace_all(&split, "${1}_${2}")
        .to_lowercase()
        .replace(' ', "_")
}

fn camel_case(text: &str) -> Option<String> {
    let spaced = NON_ALNUM_RUN.replace_all(text, " ");
    let mut words = spaced.split_whitespace();
    let first = words.next()?.to_lowercase();
    Some(words.fold(first, |mut acc, word| {
        acc.push_str(&capitalize(word));
        acc
    }))
}

pub struct ConvertCase;

#[async_trait]
impl Tool for ConvertCase {
    fn name(&self) -> &str {
        "convert_case"
    }

    fn description(&self) -> &str {
        "Convert text case. case_type options: 'upper', 'lower', 'title', 'capitalize', 'snake', 'camel', 'kebab'"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The text to convert"
                },
                "case_type": {
                    "type": "string",
                    "description": "Target case",
                    "enum": ["upper", "lower", "title", "capitalize", "snake", "camel", "kebab"]
                }
            },
            "required": ["text", "case_type"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let text = required_str(&args, "text")?;
        let case_type = required_str(&args, "case_type")?;
        Ok(convert_case(text, case_type))
    }
}
