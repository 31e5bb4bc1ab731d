//! Note CRUD tools for a task's free-text annotations.

use crate::outcome::ToolOutcome;
use crate::tool::Tool;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;
use voice_gateway_core::UserIdentity;
use voice_gateway_repository::TaskRepository;

fn note_to_json(note: &voice_gateway_repository::Note) -> Value {
    json!({
        "id": note.note_id,
        "taskId": note.task_id,
        "content": note.content,
        "createdAt": note.created_at,
    })
}

fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw).map_err(|_| format!("{field} {raw:?} is not a valid id"))
}

pub struct GetNotesByTodoIdTool {
    repository: Arc<dyn TaskRepository>,
}

impl GetNotesByTodoIdTool {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }
}

#[derive(Deserialize)]
struct ListNotesParams {
    #[serde(rename = "taskId")]
    task_id: String,
    #[serde(default = "default_limit")]
    limit: i32,
}

fn default_limit() -> i32 {
    voice_gateway_repository::model::MAX_NOTES_LIST_LIMIT
}

#[async_trait]
impl Tool for GetNotesByTodoIdTool {
    fn name(&self) -> &str {
        "getNotesByTodoId"
    }

    fn description(&self) -> &str {
        "Lists the notes attached to a task."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "taskId": {"type": "string"},
                "limit": {"type": "integer", "maximum": voice_gateway_repository::model::MAX_NOTES_LIST_LIMIT},
            },
            "required": ["taskId"],
        })
    }

    async fn invoke(&self, params: Value, identity: &UserIdentity) -> ToolOutcome {
        let params: ListNotesParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::error(format!("invalid parameters: {e}")),
        };
        let task_id = match parse_uuid(&params.task_id, "taskId") {
            Ok(id) => id,
            Err(msg) => return ToolOutcome::error(msg),
        };
        let limit = params.limit.min(voice_gateway_repository::model::MAX_NOTES_LIST_LIMIT);

        if self
            .repository
            .get_task(&identity.user_id, task_id)
            .await
            .ok()
            .flatten()
            .is_none()
        {
            return ToolOutcome::error("task not found");
        }

        match self.repository.list_notes(&identity.user_id, task_id, limit).await {
            Ok(notes) => ToolOutcome::success(json!({
                "items": notes.iter().map(note_to_json).collect::<Vec<_>>(),
            })),
            Err(e) => ToolOutcome::error(e.to_string()),
        }
    }
}

pub struct CreateNoteTool {
    repository: Arc<dyn TaskRepository>,
}

impl CreateNoteTool {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }
}

#[derive(Deserialize)]
struct CreateNoteParams {
    #[serde(rename = "taskId")]
    task_id: String,
    content: String,
}

#[async_trait]
impl Tool for CreateNoteTool {
    fn name(&self) -> &str {
        "createNote"
    }

    fn description(&self) -> &str {
        "Adds a note to an existing task."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "taskId": {"type": "string"},
                "content": {"type": "string", "maxLength": voice_gateway_repository::model::MAX_NOTE_CONTENT_LEN},
            },
            "required": ["taskId", "content"],
        })
    }

    async fn invoke(&self, params: Value, identity: &UserIdentity) -> ToolOutcome {
        let params: CreateNoteParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::error(format!("invalid parameters: {e}")),
        };
        let task_id = match parse_uuid(&params.task_id, "taskId") {
            Ok(id) => id,
            Err(msg) => return ToolOutcome::error(msg),
        };

        match self
            .repository
            .create_note(&identity.user_id, task_id, &params.content)
            .await
        {
            Ok(Some(note)) => ToolOutcome::success(note_to_json(&note)),
            Ok(None) => ToolOutcome::error("task not found"),
            Err(e) => ToolOutcome::error(e.to_string()),
        }
    }
}

pub struct DeleteNoteTool {
    repository: Arc<dyn TaskRepository>,
}

impl DeleteNoteTool {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }
}

#[derive(Deserialize)]
struct DeleteNoteParams {
    #[serde(rename = "taskId")]
    task_id: String,
    #[serde(rename = "noteId")]
    note_id: String,
}

#[async_trait]
impl Tool for DeleteNoteTool {
    fn name(&self) -> &str {
        "deleteNote"
    }

    fn description(&self) -> &str {
        "Deletes a note from a task."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "taskId": {"type": "string"},
                "noteId": {"type": "string"},
            },
            "required": ["taskId", "noteId"],
        })
    }

    async fn invoke(&self, params: Value, identity: &UserIdentity) -> ToolOutcome {
        let params: DeleteNoteParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::error(format!("invalid parameters: {e}")),
        };
        let task_id = match parse_uuid(&params.task_id, "taskId") {
            Ok(id) => id,
            Err(msg) => return ToolOutcome::error(msg),
        };
        let note_id = match parse_uuid(&params.note_id, "noteId") {
            Ok(id) => id,
            Err(msg) => return ToolOutcome::error(msg),
        };

        match self.repository.delete_note(&identity.user_id, task_id, note_id).await {
            Ok(true) => ToolOutcome::success(json!({"deleted": true})),
            Ok(false) => ToolOutcome::error("note not found"),
            Err(e) => ToolOutcome::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ToolStatus;
    use voice_gateway_repository::InMemoryTaskRepository;

    fn identity() -> UserIdentity {
        UserIdentity::new("u1", None)
    }

    #[tokio::test]
    async fn listing_notes_for_a_missing_task_is_an_error() {
        let repo: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new());
        let tool = GetNotesByTodoIdTool::new(repo);
        let outcome = tool
            .invoke(json!({"taskId": Uuid::new_v4().to_string()}), &identity())
            .await;
        assert_eq!(outcome.status, ToolStatus::Error);
    }

    #[tokio::test]
    async fn create_note_on_existing_task_succeeds() {
        let repo: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new());
        let task = repo.create_task("u1", "Buy milk", None, false).await.unwrap();
        let tool = CreateNoteTool::new(repo);
        let outcome = tool
            .invoke(json!({"taskId": task.task_id.to_string(), "content": "2%"}), &identity())
            .await;
        assert_eq!(outcome.status, ToolStatus::Success);
    }
}
