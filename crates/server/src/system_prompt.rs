//! Builds the system prompt text and tool configuration sent during
//! session setup (C7, step 4b/4c). Grounded on the teacher's
//! `prompts::system::build_system_prompt`, which composes a fixed persona
//! preamble with a per-caller greeting and a deterministic tool listing.

use serde_json::Value;
use voice_gateway_tools::ToolRegistry;

const PERSONA_PREAMBLE: &str = "\
You are a helpful voice assistant that manages the caller's tasks and notes. \
Speak naturally and briefly. When the caller asks you to look up, create, \
update, or delete a task or note, use the available tools rather than \
guessing at the answer.";

/// The `toolConfiguration` array sent in `promptStart`, in the registry's
/// iteration order, so fixtures that inspect tool position stay stable.
pub fn tool_configuration(registry: &ToolRegistry) -> Vec<Value> {
    registry.list()
}

/// The free-text system prompt: persona, caller name, and a readable
/// enumeration of available tools with their required/optional parameters.
pub fn build_system_prompt(registry: &ToolRegistry, greeting_name: &str) -> String {
    let mut prompt = format!("{PERSONA_PREAMBLE}\n\nYou are speaking with {greeting_name}.\n\n");
    prompt.push_str("Available tools:\n");

    for (name, description, schema) in registry.describe_all() {
        prompt.push_str(&format!("- {name}: {description}"));
        if let Some(params) = describe_parameters(&schema) {
            prompt.push_str(&format!(" ({params})"));
        }
        prompt.push('\n');
    }

    prompt
}

fn describe_parameters(schema: &Value) -> Option<String> {
    let properties = schema.get("properties")?.as_object()?;
    if properties.is_empty() {
        return None;
    }
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let parts: Vec<String> = properties
        .keys()
        .map(|key| {
            if required.contains(&key.as_str()) {
                key.clone()
            } else {
                format!("{key}?")
            }
        })
        .collect();

    Some(parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_gateway_tools::builtin;

    #[tokio::test]
    async fn prompt_includes_greeting_and_tool_names() {
        let registry = ToolRegistry::new();
        let repository = std::sync::Arc::new(voice_gateway_repository::InMemoryTaskRepository::new());
        builtin::register_all(&registry, repository).unwrap();

        let prompt = build_system_prompt(&registry, "Priya");
        assert!(prompt.contains("Priya"));
        assert!(prompt.contains("getAllTasks"));
        assert!(prompt.contains("createTask"));
    }

    #[test]
    fn parameters_with_optional_marker_are_distinguishable() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": {"taskId": {"type": "string"}, "title": {"type": "string"}},
            "required": ["taskId"],
        });
        let described = describe_parameters(&schema).unwrap();
        assert!(described.contains("taskId"));
        assert!(described.contains("title?"));
    }
}
