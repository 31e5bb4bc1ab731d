//! Opaque identifiers threaded through a session's lifetime.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

opaque_id!(SessionId);
opaque_id!(PromptId);
opaque_id!(ContentId);
opaque_id!(ToolUseId);

impl ContentId {
    /// Content id for a synthetic tool-result group, per the
    /// `"tool-result-" + toolUseId` convention.
    pub fn for_tool_result(tool_use_id: ToolUseId) -> Self {
        // Deterministic derivation keeps repeated calls for the same
        // tool use idempotent without a registry lookup.
        Self(Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            format!("tool-result-{tool_use_id}").as_bytes(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_display_and_parse() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn tool_result_content_id_is_deterministic() {
        let tool_use_id = ToolUseId::new();
        assert_eq!(
            ContentId::for_tool_result(tool_use_id),
            ContentId::for_tool_result(tool_use_id)
        );
    }
}
