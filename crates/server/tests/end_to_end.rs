//! End-to-end scenarios exercised against the coordinator, session, and
//! state machine directly (no live model socket) — the model-stream half
//! of each scenario is covered at the unit level in `worker.rs`.

use std::sync::Arc;
use voice_gateway_core::{ToolUseId, UserIdentity};
use voice_gateway_model::OutboundEvent;
use voice_gateway_repository::{InMemoryTaskRepository, TaskRepository};
use voice_gateway_server::coordinator::ToolInvocationCoordinator;
use voice_gateway_server::session::Session;
use voice_gateway_server::state_machine::SessionEvent;
use voice_gateway_tools::{builtin, ToolRegistry};

fn identity() -> UserIdentity {
    UserIdentity::new("u1", Some("Priya".to_string()))
}

async fn setup_session(identity: UserIdentity) -> (Arc<Session>, Arc<ToolRegistry>, Arc<dyn TaskRepository>) {
    let repository: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new());
    let registry = Arc::new(ToolRegistry::new());
    builtin::register_all(&registry, repository.clone()).unwrap();

    let session = Arc::new(Session::new(identity));
    session.apply(SessionEvent::OpenModelStream).unwrap();
    session.apply(SessionEvent::SetupPromptStart { tools: registry.list() }).unwrap();
    session
        .apply(SessionEvent::SetupSystemPrompt { text: "hi".to_string() })
        .unwrap();
    while session.pop_outbound().is_some() {}

    (session, registry, repository)
}

/// E2: Tool call — `getAllTasks` returns the user's one task, wrapped in
/// the three-frame atomic group, and never reaches the client.
#[tokio::test]
async fn e2_tool_call_returns_task_in_atomic_group() {
    let (session, registry, repository) = setup_session(identity()).await;
    repository.create_task("u1", "T1", None, false).await.unwrap();

    let coordinator = ToolInvocationCoordinator::new(session.clone(), registry);
    let tool_use_id = ToolUseId::new();
    coordinator.invoke(tool_use_id, "getAllTasks".to_string(), serde_json::json!({})).await;

    assert!(matches!(
        session.pop_outbound(),
        Some(OutboundEvent::ContentStart { tool_use_id: Some(id), .. }) if id == tool_use_id
    ));
    let result = session.pop_outbound().unwrap();
    match result {
        OutboundEvent::ToolResult { content, status, .. } => {
            assert_eq!(status, "success");
            let value = serde_json::to_value(&content[0]).unwrap();
            let items = &value["result"]["items"];
            assert_eq!(items[0]["title"], "T1");
        }
        other => panic!("expected ToolResult, got {other:?}"),
    }
    assert!(matches!(session.pop_outbound(), Some(OutboundEvent::ContentEnd { .. })));
    assert!(session.pop_outbound().is_none());
}

/// E3: Tool validation failure — an oversized description is rejected with
/// the repository's length-limit message, and the session is unaffected.
#[tokio::test]
async fn e3_oversized_description_is_rejected_with_message() {
    let (session, registry, _repository) = setup_session(identity()).await;
    let coordinator = ToolInvocationCoordinator::new(session.clone(), registry);

    let params = serde_json::json!({"title": "t", "description": "x".repeat(2000)});
    coordinator.invoke(ToolUseId::new(), "createTask".to_string(), params).await;

    session.pop_outbound(); // contentStart
    let result = session.pop_outbound().unwrap();
    match result {
        OutboundEvent::ToolResult { content, status, .. } => {
            assert_eq!(status, "error");
            let value = serde_json::to_value(&content[0]).unwrap();
            let message = value["error"].as_str().unwrap();
            assert!(message.contains("Description must not exceed 1024 characters"));
        }
        other => panic!("expected ToolResult, got {other:?}"),
    }

    assert_eq!(session.phase(), voice_gateway_server::Phase::SystemPromptSet);
}

/// E5: Model timeout — a reset-like model failure drives the session to
/// `Errored` exactly once; the session is then removed from the active
/// set by the caller (the worker's job, exercised at the unit level).
#[tokio::test]
async fn e5_model_reset_marks_session_errored() {
    let (session, _registry, _repository) = setup_session(identity()).await;
    session.apply(SessionEvent::ModelError).unwrap();
    assert_eq!(session.phase(), voice_gateway_server::Phase::Errored);

    // A second failure on an already-terminal phase is rejected, not
    // silently re-applied — `Errored` never re-enters the phase table.
    assert!(session.apply(SessionEvent::ModelError).is_err());
}

/// E6: Cascading delete — deleting a task removes its notes too; a
/// subsequent lookup reports the task as not found.
#[tokio::test]
async fn e6_delete_task_cascades_to_notes() {
    let (session, registry, repository) = setup_session(identity()).await;
    let task = repository.create_task("u1", "T1", None, false).await.unwrap();
    repository.create_note("u1", task.task_id, "a note").await.unwrap().unwrap();

    let coordinator = ToolInvocationCoordinator::new(session.clone(), registry);
    let params = serde_json::json!({"taskId": task.task_id.to_string()});
    coordinator.invoke(ToolUseId::new(), "deleteTask".to_string(), params.clone()).await;
    session.pop_outbound();
    session.pop_outbound();
    session.pop_outbound();

    coordinator
        .invoke(ToolUseId::new(), "getNotesByTodoId".to_string(), params)
        .await;
    session.pop_outbound();
    let result = session.pop_outbound().unwrap();
    match result {
        OutboundEvent::ToolResult { status, content, .. } => {
            assert_eq!(status, "error");
            let value = serde_json::to_value(&content[0]).unwrap();
            assert_eq!(value["error"], "task not found");
        }
        other => panic!("expected ToolResult, got {other:?}"),
    }
}

/// E1: Hello turn — the full setup sequence reaches `AudioOpen` and
/// correctly sequences `sessionStart`/`promptStart`/the system-prompt
/// content group before audio is accepted.
#[tokio::test]
async fn e1_hello_turn_setup_sequence_reaches_audio_open() {
    let (session, _registry, _repository) = setup_session(identity()).await;
    session.apply(SessionEvent::StartAudio).unwrap();
    assert_eq!(session.phase(), voice_gateway_server::Phase::AudioOpen);

    session.apply(SessionEvent::AudioChunk { content: "AAAA".to_string() }).unwrap();
    assert_eq!(session.phase(), voice_gateway_server::Phase::AudioOpen);

    session.apply(SessionEvent::StopAudio).unwrap();
    assert_eq!(session.phase(), voice_gateway_server::Phase::AudioClosed);
}
