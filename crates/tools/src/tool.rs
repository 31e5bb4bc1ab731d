//! The `Tool` trait — a registered capability invoked on behalf of an
//! authenticated user.

use crate::outcome::ToolOutcome;
use async_trait::async_trait;
use serde_json::Value;
use voice_gateway_core::UserIdentity;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Canonical JSON Schema for the tool's parameters. Stored once and
    /// converted to the model-facing `toolSpec` shape on demand (see
    /// `crate::schema`) rather than duplicated at registration time.
    fn parameters_schema(&self) -> Value;

    /// Invokes the tool. Must never panic in practice; the registry still
    /// guards against a panicking handler by catching the unwind and
    /// translating it into an error outcome.
    async fn invoke(&self, params: Value, identity: &UserIdentity) -> ToolOutcome;
}
