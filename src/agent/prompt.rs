//! System prompt for the agent.

use crate::tools::ToolRegistry;

const SYSTEM_MESSAGE: &str = "You are a helpful AI assistant with various utility tools. \
You can perform calculations, analyze text, format JSON, get current time, and convert text cases. \
Be concise, accurate, and helpful in your responses.";

/// Build the system prompt with tool descriptions.
pub fn build_system_prompt(tools: &ToolRegistry) -> String {
    let tool_descriptions = tools
        .list_tools()
        .iter()
        .map(|t| format!("- **{}**: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{SYSTEM_MESSAGE}\n\n## Available Tools\n{tool_descriptions}\n\n\
         Use a tool whenever it gives a more reliable answer than working it out yourself."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_tool() {
        let prompt = build_system_prompt(&ToolRegistry::new());
        assert!(prompt.starts_with("You are a helpful AI assistant"));
        for name in [
            "calculate",
            "analyze_text",
            "format_json",
            "get_current_datetime",
            "convert_case",
        ] {
            assert!(prompt.contains(&format!("- **{}**:", name)), "{name}");
        }
    }
}
