//! Conversion from a tool's canonical JSON Schema to the model-facing
//! `toolSpec` wrapper sent as part of `promptStart`'s tool configuration.

use serde_json::{Value, json};

/// `{toolSpec:{name, description, inputSchema:{json: <stringified-schema>}}}`
/// — exactly the shape External Interfaces describes for `promptStart`.
pub fn to_model_tool_spec(name: &str, description: &str, parameters_schema: &Value) -> Value {
    json!({
        "toolSpec": {
            "name": name,
            "description": description,
            "inputSchema": {
                "json": parameters_schema.to_string(),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_spec_embeds_schema_as_a_json_string() {
        let schema = json!({"type": "object", "properties": {}});
        let spec = to_model_tool_spec("getAllTasks", "lists tasks", &schema);
        let embedded = spec["toolSpec"]["inputSchema"]["json"].as_str().unwrap();
        assert_eq!(embedded, schema.to_string());
    }
}
