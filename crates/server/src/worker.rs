//! Model Stream Worker (C5): pumps queued outbound events to the model and
//! routes inbound model frames back into the session, detecting a reset
//! stream vs. any other failure. Grounded on the teacher's concurrent
//! drain/pump task split in `server::websocket::handle_socket` and the
//! `tokio::select!`-driven shutdown in `server::main`.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use voice_gateway_core::GatewayError;
use voice_gateway_model::{InboundEvent, ModelStreamReceiver, ModelStreamSender};
use voice_gateway_tools::ToolRegistry;

use crate::coordinator::ToolInvocationCoordinator;
use crate::session::{ClientNotice, Session};
use crate::state_machine::SessionEvent;

/// Upper bound on how long the drain task sleeps when the outbound queue is
/// empty, per the concurrency model's poll-interval guidance.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs a session's model stream for its lifetime: one task draining the
/// outbound queue to the model, one task pumping inbound frames back. Both
/// stop when either the session terminates or the model stream ends.
pub struct ModelStreamWorker {
    session: Arc<Session>,
    coordinator: Arc<ToolInvocationCoordinator>,
}

impl ModelStreamWorker {
    pub fn new(session: Arc<Session>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            coordinator: Arc::new(ToolInvocationCoordinator::new(session.clone(), registry)),
            session,
        }
    }

    /// Runs drain and pump concurrently until the stream or the session
    /// ends. `shutdown` lets the supervisor cut both tasks short during a
    /// graceful shutdown.
    pub async fn run(
        self,
        mut sender: ModelStreamSender,
        receiver: ModelStreamReceiver,
        shutdown: Arc<Notify>,
    ) {
        let drain_session = self.session.clone();
        let drain_shutdown = shutdown.clone();
        let drain = async move {
            loop {
                if drain_session.phase().is_terminal() {
                    let _ = sender.close().await;
                    return;
                }
                match drain_session.pop_outbound() {
                    Some(event) => {
                        if let Err(e) = sender.send(&event).await {
                            tracing::warn!(error = %e, "failed to send outbound event to model");
                            return;
                        }
                    }
                    None => {
                        tokio::select! {
                            _ = tokio::time::sleep(DRAIN_POLL_INTERVAL) => {}
                            _ = drain_shutdown.notified() => return,
                        }
                    }
                }
            }
        };

        let pump = self.pump(receiver);
        tokio::select! {
            _ = drain => {}
            _ = pump => {}
            _ = shutdown.notified() => {}
        }
    }

    async fn pump(&self, mut receiver: ModelStreamReceiver) {
        loop {
            if self.session.phase().is_terminal() {
                return;
            }
            match receiver.recv().await {
                None => {
                    tracing::info!(session_id = %self.session.id, "model stream ended");
                    let _ = self.session.apply(SessionEvent::IdleTimeout);
                    self.session.notify(ClientNotice::SessionTimeout {
                        message: "session timed out".to_string(),
                        details: "model stream ended".to_string(),
                        session_id: self.session.id.to_string(),
                    });
                    return;
                }
                Some(Err(err)) => {
                    tracing::warn!(session_id = %self.session.id, error = %err, "model stream read failed");
                    if err.is_reset() {
                        let _ = self.session.apply(SessionEvent::IdleTimeout);
                        self.session.notify(ClientNotice::SessionTimeout {
                            message: "session timed out".to_string(),
                            details: err.to_string(),
                            session_id: self.session.id.to_string(),
                        });
                    } else {
                        let _ = self.session.apply(SessionEvent::ModelError);
                        self.session.notify(ClientNotice::Error { message: err.to_string() });
                    }
                    return;
                }
                Some(Ok(frame)) => self.handle_frame(frame).await,
            }
        }
    }

    async fn handle_frame(&self, frame: InboundEvent) {
        self.session.touch();

        // ContentStart/ContentEnd tagged as tool content are the
        // coordinator's internal plumbing around a toolResult group, not
        // something the client's transcript should see.
        let tool_tagged = frame.is_tool_tagged();

        match frame {
            InboundEvent::ToolUse { tool_use_id, tool_name, params } => {
                self.coordinator.invoke(tool_use_id, tool_name, params).await;
            }
            InboundEvent::TextOutput { content, role, content_id, completion_id } => {
                self.session.notify(ClientNotice::TextOutput { role, content, content_id, completion_id });
            }
            InboundEvent::AudioOutput { content } => {
                self.session.notify(ClientNotice::AudioOutput { content });
            }
            InboundEvent::ContentStart { content_id, content_type, role, completion_id, generation_stage } => {
                if !tool_tagged {
                    self.session.notify(ClientNotice::ContentStart {
                        content_type,
                        role,
                        content_id,
                        completion_id,
                        generation_stage,
                    });
                }
            }
            InboundEvent::ContentEnd { content_type, role, content_id, completion_id, stop_reason } => {
                if !tool_tagged {
                    self.session.notify(ClientNotice::ContentEnd {
                        content_type,
                        role,
                        content_id,
                        completion_id,
                        stop_reason,
                    });
                }
            }
            InboundEvent::StreamComplete => {
                tracing::debug!(session_id = %self.session.id, "model reported stream complete");
                self.session.notify(ClientNotice::StreamComplete);
            }
            InboundEvent::ModelStreamError { message } | InboundEvent::InternalServerError { message } => {
                tracing::warn!(session_id = %self.session.id, %message, "model reported an error frame");
                let _ = self.session.apply(SessionEvent::ModelError);
                self.session.notify(ClientNotice::Error { message });
            }
            InboundEvent::Unknown { kind, .. } => {
                tracing::debug!(session_id = %self.session.id, %kind, "ignored unrecognized model frame");
            }
        }
    }
}
