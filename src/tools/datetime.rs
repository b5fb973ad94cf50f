//! Current date/time tool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::Tool;

/// Current UTC time. Only UTC is supported; `timezone` is accepted for
/// compatibility and otherwise ignored.
pub fn get_current_datetime(timezone: Option<&str>) -> String {
    if let Some(tz) = timezone.filter(|tz| !tz.eq_ignore_ascii_case("utc")) {
        tracing::debug!("Ignoring unsupported timezone '{}', using UTC", tz);
    }
    format_datetime(Utc::now())
}

fn format_datetime(now: DateTime<Utc>) -> String {
    format!(
        "Current date and time (UTC): {}",
        now.format("%Y-%m-%d %H:%M:%S")
    )
}

pub struct GetCurrentDatetime;

#[async_trait]
impl Tool for GetCurrentDatetime {
    fn name(&self) -> &str {
        "get_current_datetime"
    }

    fn description(&self) -> &str {
        "Get the current date and time. Timezone parameter is optional (currently only UTC is supported)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "timezone": {
                    "type": "string",
                    "description": "Timezone name (default: UTC)",
                    "default": "UTC"
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let timezone = args.get("timezone").and_then(Value::as_str);
        Ok(get_current_datetime(timezone))
    }
}
