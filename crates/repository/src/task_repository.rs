//! The Task Repository capability (C2) — abstract storage for tasks and
//! their notes, keyed by user.

use crate::error::RepositoryError;
use crate::model::{Note, Task, TaskPatch};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, RepositoryError>;

    async fn get_task(&self, user_id: &str, task_id: Uuid) -> Result<Option<Task>, RepositoryError>;

    async fn create_task(
        &self,
        user_id: &str,
        title: &str,
        description: Option<String>,
        completed: bool,
    ) -> Result<Task, RepositoryError>;

    async fn update_task(
        &self,
        user_id: &str,
        task_id: Uuid,
        patch: TaskPatch,
    ) -> Result<Option<Task>, RepositoryError>;

    /// Deletes the task and all of its notes. The note cascade is
    /// serialized inside this call — the gateway does not compose
    /// multi-step transactions on top of the repository beyond this.
    async fn delete_task(&self, user_id: &str, task_id: Uuid) -> Result<bool, RepositoryError>;

    async fn list_notes(
        &self,
        user_id: &str,
        task_id: Uuid,
        limit: i32,
    ) -> Result<Vec<Note>, RepositoryError>;

    /// Returns `Ok(None)` if the task does not exist — the caller (a tool
    /// handler) maps that to a structured "task not found" result.
    async fn create_note(
        &self,
        user_id: &str,
        task_id: Uuid,
        content: &str,
    ) -> Result<Option<Note>, RepositoryError>;

    async fn delete_note(
        &self,
        user_id: &str,
        task_id: Uuid,
        note_id: Uuid,
    ) -> Result<bool, RepositoryError>;
}
