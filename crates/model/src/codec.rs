//! Event Codec (C3): encodes outbound events for the model stream and
//! decodes inbound frames, classifying anything unrecognized as `Unknown`
//! rather than erroring. Grounded on the teacher's tagged-enum `WsMessage`
//! in `server::websocket` and its never-panic handling of unmatched frame
//! kinds.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use voice_gateway_core::{ContentId, PromptId, ToolUseId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentType {
    Text,
    Audio,
    Tool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GenerationStage {
    Speculative,
    Final,
}

pub const STOP_REASON_INTERRUPTED: &str = "INTERRUPTED";

/// Outbound kinds: gateway -> model.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum OutboundEvent {
    SessionStart,
    PromptStart {
        prompt_id: PromptId,
        /// `{toolSpec:{...}}` entries, already in model-facing shape.
        tools: Vec<Value>,
    },
    ContentStart {
        prompt_id: PromptId,
        content_id: ContentId,
        content_type: ContentType,
        role: Role,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_use_id: Option<ToolUseId>,
    },
    TextInput {
        prompt_id: PromptId,
        content_id: ContentId,
        content: String,
    },
    AudioInput {
        prompt_id: PromptId,
        content_id: ContentId,
        /// base64-encoded 16 kHz 16-bit little-endian mono PCM.
        content: String,
    },
    ToolResult {
        prompt_id: PromptId,
        content_id: ContentId,
        tool_use_id: ToolUseId,
        content: Vec<Value>,
        status: String,
    },
    ContentEnd {
        prompt_id: PromptId,
        content_id: ContentId,
    },
    PromptEnd {
        prompt_id: PromptId,
    },
    SessionEnd,
}

impl OutboundEvent {
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("OutboundEvent always serializes")
    }
}

/// Inbound kinds: model -> gateway. Anything not recognized decodes to
/// `Unknown` — the codec never fails a session over a malformed or novel
/// frame.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    ContentStart {
        content_id: ContentId,
        content_type: ContentType,
        role: Role,
        completion_id: Option<String>,
        generation_stage: Option<GenerationStage>,
    },
    TextOutput {
        content: String,
        role: Role,
        completion_id: Option<String>,
        content_id: ContentId,
    },
    AudioOutput {
        /// base64-encoded 24 kHz 16-bit little-endian mono PCM.
        content: String,
    },
    ToolUse {
        tool_use_id: ToolUseId,
        tool_name: String,
        params: Value,
    },
    ContentEnd {
        content_type: ContentType,
        role: Role,
        completion_id: Option<String>,
        content_id: ContentId,
        stop_reason: Option<String>,
    },
    StreamComplete,
    ModelStreamError {
        message: String,
    },
    InternalServerError {
        message: String,
    },
    Unknown {
        kind: String,
        raw: Value,
    },
}

impl InboundEvent {
    /// True for content tagged `type=TOOL`/`role=TOOL` — filtered from
    /// client forwarding per the Model Stream Worker's pump step.
    pub fn is_tool_tagged(&self) -> bool {
        match self {
            InboundEvent::ContentStart { content_type, role, .. }
            | InboundEvent::ContentEnd { content_type, role, .. } => {
                *content_type == ContentType::Tool || *role == Role::Tool
            }
            _ => false,
        }
    }
}

fn field_str(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn parse_content_id(value: &Value) -> Option<ContentId> {
    field_str(value, "contentId")?.parse().ok()
}

fn parse_content_type(value: &Value) -> Option<ContentType> {
    serde_json::from_value(value.get("contentType")?.clone()).ok()
}

fn parse_role(value: &Value) -> Option<Role> {
    serde_json::from_value(value.get("role")?.clone()).ok()
}

/// Decodes one inbound frame. Infallible: malformed JSON or an
/// unrecognized/incomplete shape becomes `Unknown` and is logged by the
/// caller, never propagated as a decode error.
pub fn decode_inbound(bytes: &[u8]) -> InboundEvent {
    let raw: Value = match serde_json::from_slice(bytes) {
        Ok(v) => v,
        Err(_) => {
            return InboundEvent::Unknown {
                kind: "malformed".to_string(),
                raw: Value::String(String::from_utf8_lossy(bytes).into_owned()),
            };
        }
    };

    let kind = raw.get("event").and_then(Value::as_str).unwrap_or("").to_string();

    let decoded = match kind.as_str() {
        "contentStart" => (|| {
            Some(InboundEvent::ContentStart {
                content_id: parse_content_id(&raw)?,
                content_type: parse_content_type(&raw)?,
                role: parse_role(&raw)?,
                completion_id: field_str(&raw, "completionId"),
                generation_stage: raw
                    .get("additionalModelFields")
                    .and_then(|f| f.get("generationStage"))
                    .and_then(|v| serde_json::from_value(v.clone()).ok()),
            })
        })(),
        "textOutput" => (|| {
            Some(InboundEvent::TextOutput {
                content: field_str(&raw, "content")?,
                role: parse_role(&raw)?,
                completion_id: field_str(&raw, "completionId"),
                content_id: parse_content_id(&raw)?,
            })
        })(),
        "audioOutput" => Some(InboundEvent::AudioOutput {
            content: field_str(&raw, "content").unwrap_or_default(),
        }),
        "toolUse" => (|| {
            Some(InboundEvent::ToolUse {
                tool_use_id: field_str(&raw, "toolUseId")?.parse().ok()?,
                tool_name: field_str(&raw, "toolName")?,
                params: raw.get("content").cloned().unwrap_or(Value::Null),
            })
        })(),
        "contentEnd" => (|| {
            Some(InboundEvent::ContentEnd {
                content_type: parse_content_type(&raw)?,
                role: parse_role(&raw)?,
                completion_id: field_str(&raw, "completionId"),
                content_id: parse_content_id(&raw)?,
                stop_reason: field_str(&raw, "stopReason"),
            })
        })(),
        "streamComplete" => Some(InboundEvent::StreamComplete),
        "modelStreamError" => Some(InboundEvent::ModelStreamError {
            message: field_str(&raw, "message").unwrap_or_default(),
        }),
        "internalServerError" => Some(InboundEvent::InternalServerError {
            message: field_str(&raw, "message").unwrap_or_default(),
        }),
        _ => None,
    };

    decoded.unwrap_or(InboundEvent::Unknown { kind, raw })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_session_start_encodes_with_camel_case_tag() {
        let encoded = OutboundEvent::SessionStart.encode();
        let value: Value = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(value["event"], "sessionStart");
    }

    #[test]
    fn decode_classifies_unknown_kind_without_failing() {
        let frame = serde_json::to_vec(&serde_json::json!({"event": "somethingNew"})).unwrap();
        match decode_inbound(&frame) {
            InboundEvent::Unknown { kind, .. } => assert_eq!(kind, "somethingNew"),
            other => panic!("expected Unknown, got {other:?}"),
        }
    }

    #[test]
    fn decode_tolerates_malformed_json() {
        match decode_inbound(b"not json") {
            InboundEvent::Unknown { kind, .. } => assert_eq!(kind, "malformed"),
            other => panic!("expected Unknown, got {other:?}"),
        }
    }

    #[test]
    fn decode_tool_use_extracts_fields() {
        let tool_use_id = ToolUseId::new();
        let frame = serde_json::to_vec(&serde_json::json!({
            "event": "toolUse",
            "toolUseId": tool_use_id.to_string(),
            "toolName": "getAllTasks",
            "content": {},
        }))
        .unwrap();
        match decode_inbound(&frame) {
            InboundEvent::ToolUse { tool_name, .. } => assert_eq!(tool_name, "getAllTasks"),
            other => panic!("expected ToolUse, got {other:?}"),
        }
    }

    #[test]
    fn content_end_with_interrupted_stop_reason_is_tool_tagged_when_role_tool() {
        let event = InboundEvent::ContentEnd {
            content_type: ContentType::Tool,
            role: Role::Tool,
            completion_id: None,
            content_id: ContentId::new(),
            stop_reason: None,
        };
        assert!(event.is_tool_tagged());
    }
}
