//! The authenticated user identity carried by a Session for its lifetime.

use serde::{Deserialize, Serialize};

/// Decoded, already-validated identity claims for one connection.
///
/// Immutable once a session is created — see spec's Session.userIdentity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
    pub display_name: Option<String>,
    /// Raw decoded claims, kept around for tool handlers that need more
    /// than user_id/display_name.
    pub claims: serde_json::Value,
}

impl UserIdentity {
    pub fn new(user_id: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name,
            claims: serde_json::Value::Null,
        }
    }

    pub fn with_claims(mut self, claims: serde_json::Value) -> Self {
        self.claims = claims;
        self
    }

    pub fn greeting_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.user_id)
    }
}
