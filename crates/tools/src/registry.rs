//! Tool Registry (C1) — holds tool schemas and handlers, exposes
//! lookup/execution under a user identity. Narrowed from the teacher's
//! `tools::registry::ToolRegistry`/`ToolExecutor` to the register/list/
//! invoke surface the gateway needs.

use crate::error::ToolError;
use crate::outcome::ToolOutcome;
use crate::tool::Tool;
use crate::tracker::ToolCallTracker;
use futures::FutureExt;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use voice_gateway_core::UserIdentity;

pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
    tracker: ToolCallTracker,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
            tracker: ToolCallTracker::new(),
        }
    }

    /// Idempotent in name; registering a name twice is an error (unlike the
    /// teacher's registry, which silently overwrites).
    pub fn register(&self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let mut tools = self.tools.write();
        if tools.contains_key(tool.name()) {
            return Err(ToolError::AlreadyRegistered(tool.name().to_string()));
        }
        tools.insert(tool.name().to_string(), tool);
        Ok(())
    }

    /// All tools in the model-facing `toolSpec` shape, for embedding in
    /// `promptStart`.
    pub fn list(&self) -> Vec<Value> {
        self.tools
            .read()
            .values()
            .map(|t| crate::schema::to_model_tool_spec(t.name(), t.description(), &t.parameters_schema()))
            .collect()
    }

    /// Tools for the system-prompt text enumeration: name, description, and
    /// the raw parameter schema (so the caller can list required/optional
    /// parameters).
    pub fn describe_all(&self) -> Vec<(String, String, Value)> {
        self.tools
            .read()
            .values()
            .map(|t| (t.name().to_string(), t.description().to_string(), t.parameters_schema()))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().get(name).cloned()
    }

    pub fn tracker(&self) -> &ToolCallTracker {
        &self.tracker
    }

    /// Invokes a tool by name. Never panics: parameter validation failures,
    /// missing tools, and handler panics all become `status=error` outcomes.
    pub async fn invoke(&self, name: &str, params: Value, identity: &UserIdentity) -> ToolOutcome {
        let Some(tool) = self.get(name) else {
            return ToolOutcome::error(format!("unknown tool {name:?}"));
        };

        if let Some(schema) = tool.parameters_schema().as_object() {
            if !schema.is_empty() {
                if let Ok(compiled) = jsonschema::JSONSchema::compile(&tool.parameters_schema()) {
                    if let Err(errors) = compiled.validate(&params) {
                        let message = errors.map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
                        self.tracker
                            .record(name, &identity.user_id, crate::outcome::ToolStatus::Error, std::time::Duration::ZERO);
                        return ToolOutcome::error(message);
                    }
                }
            }
        }

        let started = Instant::now();
        let outcome = AssertUnwindSafe(tool.invoke(params, identity))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| ToolOutcome::error(format!("tool {name:?} panicked")));

        self.tracker
            .record(name, &identity.user_id, outcome.status, started.elapsed());
        outcome
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ToolStatus;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes its input"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn invoke(&self, params: Value, _identity: &UserIdentity) -> ToolOutcome {
            ToolOutcome::success(params)
        }
    }

    struct PanickingTool;

    #[async_trait]
    impl Tool for PanickingTool {
        fn name(&self) -> &str {
            "boom"
        }
        fn description(&self) -> &str {
            "always panics"
        }
        fn parameters_schema(&self) -> Value {
            json!({})
        }
        async fn invoke(&self, _params: Value, _identity: &UserIdentity) -> ToolOutcome {
            panic!("handler exploded");
        }
    }

    fn identity() -> UserIdentity {
        UserIdentity::new("u1", Some("Alice".to_string()))
    }

    #[tokio::test]
    async fn register_rejects_duplicate_names() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        assert!(registry.register(Arc::new(EchoTool)).is_err());
    }

    #[tokio::test]
    async fn invoke_unknown_tool_is_an_error_outcome_not_a_panic() {
        let registry = ToolRegistry::new();
        let outcome = registry.invoke("nope", json!({}), &identity()).await;
        assert_eq!(outcome.status, ToolStatus::Error);
    }

    #[tokio::test]
    async fn handler_panic_is_caught() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(PanickingTool)).unwrap();
        let outcome = registry.invoke("boom", json!({}), &identity()).await;
        assert_eq!(outcome.status, ToolStatus::Error);
    }
}
