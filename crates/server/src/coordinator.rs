//! Tool Invocation Coordinator (C6): looks up and invokes a tool by name,
//! then enqueues the model-facing result as one atomic three-frame group.
//! Grounded on the teacher's `tools::executor::ToolExecutor::execute`
//! lookup-invoke-format shape, adapted to the outbound-queue delivery this
//! gateway uses instead of a direct function return.

use serde_json::Value;
use std::sync::Arc;
use voice_gateway_core::{ContentId, ToolUseId};
use voice_gateway_model::{ContentType, OutboundEvent, Role};
use voice_gateway_tools::{ToolOutcome, ToolRegistry, ToolStatus};

use crate::session::{ClientNotice, Session};

pub struct ToolInvocationCoordinator {
    session: Arc<Session>,
    registry: Arc<ToolRegistry>,
}

impl ToolInvocationCoordinator {
    pub fn new(session: Arc<Session>, registry: Arc<ToolRegistry>) -> Self {
        Self { session, registry }
    }

    /// Invokes `tool_name` with `params` on behalf of the session's
    /// identity, then enqueues `contentStart` / `toolResult` / `contentEnd`
    /// as one atomic group so the worker's drain task can never interleave
    /// another outbound event between them.
    pub async fn invoke(&self, tool_use_id: ToolUseId, tool_name: String, params: Value) {
        tracing::info!(
            session_id = %self.session.id,
            tool = %tool_name,
            "invoking tool"
        );

        let outcome = self.registry.invoke(&tool_name, params, &self.session.identity).await;
        self.enqueue_result(tool_use_id, &tool_name, outcome);

        self.session.notify(ClientNotice::ToolInvoked { tool_name });
    }

    fn enqueue_result(&self, tool_use_id: ToolUseId, tool_name: &str, outcome: ToolOutcome) {
        let content_id = ContentId::for_tool_result(tool_use_id);
        let prompt_id = self.session.prompt_id();
        let status = match outcome.status {
            ToolStatus::Success => "success",
            ToolStatus::Error => "error",
        };

        let content: Vec<Value> = outcome
            .content
            .into_iter()
            .map(|c| serde_json::to_value(c).expect("ToolResultContent always serializes"))
            .collect();

        tracing::debug!(
            session_id = %self.session.id,
            tool = %tool_name,
            %status,
            "enqueuing tool result group"
        );

        let result = self.session.enqueue_raw(vec![
            OutboundEvent::ContentStart {
                prompt_id,
                content_id,
                content_type: ContentType::Tool,
                role: Role::Tool,
                tool_use_id: Some(tool_use_id),
            },
            OutboundEvent::ToolResult {
                prompt_id,
                content_id,
                tool_use_id,
                content,
                status: status.to_string(),
            },
            OutboundEvent::ContentEnd { prompt_id, content_id },
        ]);

        if let Err(e) = result {
            tracing::error!(
                session_id = %self.session.id,
                tool = %tool_name,
                error = %e,
                "failed to enqueue tool result group"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_gateway_core::UserIdentity;
    use voice_gateway_model::OutboundEvent;

    fn identity() -> UserIdentity {
        UserIdentity::new("u1", Some("Alice".to_string()))
    }

    #[tokio::test]
    async fn invoking_unknown_tool_still_enqueues_an_error_result_group() {
        let session = Arc::new(Session::new(identity()));
        session.apply(crate::state_machine::SessionEvent::OpenModelStream).unwrap();
        session.pop_outbound(); // drain sessionStart

        let registry = Arc::new(ToolRegistry::new());
        let coordinator = ToolInvocationCoordinator::new(session.clone(), registry);

        let tool_use_id = ToolUseId::new();
        coordinator.invoke(tool_use_id, "nope".to_string(), serde_json::json!({})).await;

        let first = session.pop_outbound().unwrap();
        assert!(matches!(first, OutboundEvent::ContentStart { tool_use_id: Some(id), .. } if id == tool_use_id));

        let second = session.pop_outbound().unwrap();
        match second {
            OutboundEvent::ToolResult { status, .. } => assert_eq!(status, "error"),
            other => panic!("expected ToolResult, got {other:?}"),
        }

        assert!(matches!(session.pop_outbound(), Some(OutboundEvent::ContentEnd { .. })));
        assert!(session.pop_outbound().is_none());
    }
}
