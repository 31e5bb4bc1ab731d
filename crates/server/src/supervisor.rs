//! Gateway Supervisor (C8): admits sessions up to the configured
//! concurrency cap, and drains every live session to `Terminated` within a
//! bounded grace period on shutdown. Grounded on the teacher's
//! `server::main::shutdown_signal` ctrl_c/SIGTERM `tokio::select!`, extended
//! with the per-session draining the teacher's version does not do.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use voice_gateway_core::{SessionId, UserIdentity};
use voice_gateway_tools::ToolRegistry;

use crate::session::{Session, SessionRegistry};
use crate::state_machine::SessionEvent;

pub struct GatewaySupervisor {
    registry: SessionRegistry,
    tool_registry: Arc<ToolRegistry>,
    max_concurrent: usize,
    shutdown_grace: Duration,
    active: AtomicUsize,
    shutdown: Arc<Notify>,
}

impl GatewaySupervisor {
    pub fn new(tool_registry: Arc<ToolRegistry>, max_concurrent: usize, shutdown_grace: Duration) -> Self {
        Self {
            registry: SessionRegistry::new(),
            tool_registry,
            max_concurrent,
            shutdown_grace,
            active: AtomicUsize::new(0),
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn tool_registry(&self) -> Arc<ToolRegistry> {
        self.tool_registry.clone()
    }

    pub fn shutdown_signal(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    pub fn active_sessions(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Registers a new session for `identity` if under the concurrency cap;
    /// `None` means the caller should reject the connection.
    pub fn admit(&self, identity: UserIdentity) -> Option<Arc<Session>> {
        loop {
            let current = self.active.load(Ordering::Acquire);
            if current >= self.max_concurrent {
                metrics::counter!("gateway_sessions_rejected_total").increment(1);
                return None;
            }
            if self
                .active
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }

        let session = Arc::new(Session::new(identity));
        self.registry.insert(session.clone());
        metrics::gauge!("gateway_active_sessions").set(self.active_sessions() as f64);
        Some(session)
    }

    pub fn release(&self, id: SessionId) {
        if self.registry.remove(id).is_some() {
            self.active.fetch_sub(1, Ordering::AcqRel);
            metrics::gauge!("gateway_active_sessions").set(self.active_sessions() as f64);
        }
    }

    /// Sweeps sessions idle past `threshold`, driving each to `Terminated`.
    /// Intended to run on a periodic tick from `main`.
    pub fn sweep_idle(&self, threshold: Duration) {
        for session in self.registry.idle_sessions(threshold) {
            tracing::info!(session_id = %session.id, "closing idle session");
            let _ = session.apply(SessionEvent::IdleTimeout);
            self.release(session.id);
        }
    }

    /// Signals every task waiting on the shutdown notifier, then waits up
    /// to `shutdown_grace` for active sessions to drain on their own before
    /// returning.
    pub async fn shutdown(&self) {
        tracing::info!(active = self.active_sessions(), "gateway shutdown initiated");
        self.shutdown.notify_waiters();

        let deadline = tokio::time::Instant::now() + self.shutdown_grace;
        while self.active_sessions() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        if self.active_sessions() > 0 {
            tracing::warn!(
                remaining = self.active_sessions(),
                "shutdown grace period elapsed with sessions still active"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_gateway_core::UserIdentity;

    fn identity() -> UserIdentity {
        UserIdentity::new("u1", Some("Alice".to_string()))
    }

    #[test]
    fn admit_rejects_past_the_concurrency_cap() {
        let supervisor = GatewaySupervisor::new(Arc::new(ToolRegistry::new()), 1, Duration::from_secs(1));
        assert!(supervisor.admit(identity()).is_some());
        assert!(supervisor.admit(identity()).is_none());
    }

    #[test]
    fn release_frees_a_capacity_slot() {
        let supervisor = GatewaySupervisor::new(Arc::new(ToolRegistry::new()), 1, Duration::from_secs(1));
        let session = supervisor.admit(identity()).unwrap();
        let id = session.id;
        drop(session);
        supervisor.release(id);
        assert!(supervisor.admit(identity()).is_some());
    }
}
