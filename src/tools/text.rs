//! Text statistics tool.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{required_str, Tool};

const WORDS_PER_MINUTE: f64 = 200.0;

/// Produce a character, word, and sentence report for `text`.
pub fn analyze_text(text: &str) -> String {
    let char_count = text.chars().count();
    let char_count_no_spaces = text.chars().filter(|&c| c != ' ').count();
    let word_count = text.split_whitespace().count();

    // Runs of terminators yield empty fragments, which are dropped.
    let sentence_count = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count();

    let reading_time = word_count as f64 / WORDS_PER_MINUTE;
    let words_per_sentence = word_count as f64 / sentence_count.max(1) as f64;

    format!(
        "Text Analysis:\n\
         - Characters (with spaces): {}\n\
         - Characters (without spaces): {}\n\
         - Words: {}\n\
         - Sentences: {}\n\
         - Estimated reading time: {:.1} minutes\n\
         - Average words per sentence: {:.1}",
        char_count,
        char_count_no_spaces,
        word_count,
        sentence_count,
        reading_time,
        words_per_sentence
    )
}

pub struct AnalyzeText;

#[async_trait]
impl Tool for AnalyzeText {
    fn name(&self) -> &str {
        "analyze_text"
    }

    fn description(&self) -> &str {
        "Analyze text and return statistics including word count, character count, sentence count, and reading time estimate."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The text to analyze"
                }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let text = required_str(&args, "text")?;
        Ok(analyze_text(text))
    }
}
