//! The tagged outcome a tool invocation produces — per the design note to
//! express tool outcomes as a tagged result type rather than throwing.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    Result { result: serde_json::Value },
    Error { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolOutcome {
    pub content: Vec<ToolResultContent>,
    pub status: ToolStatus,
}

impl ToolOutcome {
    pub fn success(result: serde_json::Value) -> Self {
        Self {
            content: vec![ToolResultContent::Result { result }],
            status: ToolStatus::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolResultContent::Error {
                error: message.into(),
            }],
            status: ToolStatus::Error,
        }
    }
}
