//! Task CRUD tools, wrapping a `TaskRepository`.

use crate::outcome::ToolOutcome;
use crate::tool::Tool;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;
use voice_gateway_core::UserIdentity;
use voice_gateway_repository::{TaskPatch, TaskRepository};

fn task_to_json(task: &voice_gateway_repository::Task) -> Value {
    json!({
        "id": task.task_id,
        "title": task.title,
        "description": task.description,
        "completed": task.completed,
        "createdAt": task.created_at,
        "updatedAt": task.updated_at,
    })
}

fn parse_task_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw).map_err(|_| format!("{raw:?} is not a valid task id"))
}

pub struct GetAllTasksTool {
    repository: Arc<dyn TaskRepository>,
}

impl GetAllTasksTool {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Tool for GetAllTasksTool {
    fn name(&self) -> &str {
        "getAllTasks"
    }

    fn description(&self) -> &str {
        "Lists every task owned by the current user."
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn invoke(&self, _params: Value, identity: &UserIdentity) -> ToolOutcome {
        match self.repository.list_tasks(&identity.user_id).await {
            Ok(tasks) => ToolOutcome::success(json!({
                "items": tasks.iter().map(task_to_json).collect::<Vec<_>>(),
            })),
            Err(e) => ToolOutcome::error(e.to_string()),
        }
    }
}

pub struct GetTaskByIdTool {
    repository: Arc<dyn TaskRepository>,
}

impl GetTaskByIdTool {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }
}

#[derive(Deserialize)]
struct GetTaskParams {
    #[serde(rename = "taskId")]
    task_id: String,
}

#[async_trait]
impl Tool for GetTaskByIdTool {
    fn name(&self) -> &str {
        "getTaskById"
    }

    fn description(&self) -> &str {
        "Fetches a single task by id."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"taskId": {"type": "string"}},
            "required": ["taskId"],
        })
    }

    async fn invoke(&self, params: Value, identity: &UserIdentity) -> ToolOutcome {
        let params: GetTaskParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::error(format!("invalid parameters: {e}")),
        };
        let task_id = match parse_task_id(&params.task_id) {
            Ok(id) => id,
            Err(msg) => return ToolOutcome::error(msg),
        };

        match self.repository.get_task(&identity.user_id, task_id).await {
            Ok(Some(task)) => ToolOutcome::success(task_to_json(&task)),
            Ok(None) => ToolOutcome::error("task not found"),
            Err(e) => ToolOutcome::error(e.to_string()),
        }
    }
}

pub struct CreateTaskTool {
    repository: Arc<dyn TaskRepository>,
}

impl CreateTaskTool {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }
}

#[derive(Deserialize)]
struct CreateTaskParams {
    title: String,
    description: Option<String>,
    #[serde(default)]
    completed: bool,
}

#[async_trait]
impl Tool for CreateTaskTool {
    fn name(&self) -> &str {
        "createTask"
    }

    fn description(&self) -> &str {
        "Creates a new task for the current user."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string", "maxLength": voice_gateway_repository::model::MAX_TITLE_LEN},
                "description": {"type": "string", "maxLength": voice_gateway_repository::model::MAX_DESCRIPTION_LEN},
                "completed": {"type": "boolean"},
            },
            "required": ["title"],
        })
    }

    async fn invoke(&self, params: Value, identity: &UserIdentity) -> ToolOutcome {
        let params: CreateTaskParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::error(format!("invalid parameters: {e}")),
        };

        match self
            .repository
            .create_task(&identity.user_id, &params.title, params.description, params.completed)
            .await
        {
            Ok(task) => ToolOutcome::success(task_to_json(&task)),
            Err(e) => ToolOutcome::error(e.to_string()),
        }
    }
}

pub struct UpdateTaskTool {
    repository: Arc<dyn TaskRepository>,
}

impl UpdateTaskTool {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }
}

#[derive(Deserialize)]
struct UpdateTaskParams {
    #[serde(rename = "taskId")]
    task_id: String,
    title: Option<String>,
    #[serde(default)]
    description: Option<Option<String>>,
    completed: Option<bool>,
}

#[async_trait]
impl Tool for UpdateTaskTool {
    fn name(&self) -> &str {
        "updateTask"
    }

    fn description(&self) -> &str {
        "Updates the title, description, or completion status of an existing task."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "taskId": {"type": "string"},
                "title": {"type": "string"},
                "description": {"type": "string"},
                "completed": {"type": "boolean"},
            },
            "required": ["taskId"],
        })
    }

    async fn invoke(&self, params: Value, identity: &UserIdentity) -> ToolOutcome {
        let params: UpdateTaskParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::error(format!("invalid parameters: {e}")),
        };
        let task_id = match parse_task_id(&params.task_id) {
            Ok(id) => id,
            Err(msg) => return ToolOutcome::error(msg),
        };

        let patch = TaskPatch {
            title: params.title,
            description: params.description,
            completed: params.completed,
        };

        match self.repository.update_task(&identity.user_id, task_id, patch).await {
            Ok(Some(task)) => ToolOutcome::success(task_to_json(&task)),
            Ok(None) => ToolOutcome::error("task not found"),
            Err(e) => ToolOutcome::error(e.to_string()),
        }
    }
}

pub struct DeleteTaskTool {
    repository: Arc<dyn TaskRepository>,
}

impl DeleteTaskTool {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }
}

#[derive(Deserialize)]
struct DeleteTaskParams {
    #[serde(rename = "taskId")]
    task_id: String,
}

#[async_trait]
impl Tool for DeleteTaskTool {
    fn name(&self) -> &str {
        "deleteTask"
    }

    fn description(&self) -> &str {
        "Deletes a task and all of its notes."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"taskId": {"type": "string"}},
            "required": ["taskId"],
        })
    }

    async fn invoke(&self, params: Value, identity: &UserIdentity) -> ToolOutcome {
        let params: DeleteTaskParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::error(format!("invalid parameters: {e}")),
        };
        let task_id = match parse_task_id(&params.task_id) {
            Ok(id) => id,
            Err(msg) => return ToolOutcome::error(msg),
        };

        match self.repository.delete_task(&identity.user_id, task_id).await {
            Ok(true) => ToolOutcome::success(json!({"deleted": true})),
            Ok(false) => ToolOutcome::error("task not found"),
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
    async fn create_task_rejects_oversized_description() {
        let repo: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new());
        let tool = CreateTaskTool::new(repo);
        let outcome = tool
            .invoke(json!({"title": "t", "description": "x".repeat(2000)}), &identity())
            .await;
        assert_eq!(outcome.status, ToolStatus::Error);
    }

    #[tokio::test]
    async fn get_task_by_id_reports_not_found() {
        let repo: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new());
        let tool = GetTaskByIdTool::new(repo);
        let outcome = tool
            .invoke(json!({"taskId": Uuid::new_v4().to_string()}), &identity())
            .await;
        assert_eq!(outcome.status, ToolStatus::Error);
    }
}
