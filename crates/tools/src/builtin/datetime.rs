//! Pure, stateless date/time lookup tool.

use crate::outcome::ToolOutcome;
use crate::tool::Tool;
use async_trait::async_trait;
use serde_json::{Value, json};
use voice_gateway_core::UserIdentity;

pub struct DateTimeTool;

#[async_trait]
impl Tool for DateTimeTool {
    fn name(&self) -> &str {
        "getCurrentDateTime"
    }

    fn description(&self) -> &str {
        "Returns the current UTC date and time."
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn invoke(&self, _params: Value, _identity: &UserIdentity) -> ToolOutcome {
        let now = chrono::Utc::now();
        ToolOutcome::success(json!({
            "iso8601": now.to_rfc3339(),
            "unixMillis": now.timestamp_millis(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ToolStatus;

    #[tokio::test]
    async fn returns_a_parseable_timestamp() {
        let tool = DateTimeTool;
        let identity = UserIdentity::new("u1", None);
        let outcome = tool.invoke(json!({}), &identity).await;
        assert_eq!(outcome.status, ToolStatus::Success);
    }
}
