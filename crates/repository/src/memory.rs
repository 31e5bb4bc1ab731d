//! In-memory Task Repository — the default backend, used in tests and
//! local development. Grounded on the `parking_lot::RwLock`-guarded map
//! pattern the teacher uses for `InMemorySessionStore`.

use crate::error::RepositoryError;
use crate::model::{self, Note, Task, TaskPatch};
use crate::task_repository::TaskRepository;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    tasks: HashMap<Uuid, Task>,
    notes: HashMap<Uuid, Vec<Note>>,
}

#[derive(Default)]
pub struct InMemoryTaskRepository {
    inner: RwLock<Inner>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned_by<'a>(task: &'a Task, user_id: &str) -> Option<&'a Task> {
    (task.user_id == user_id).then_some(task)
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, RepositoryError> {
        let inner = self.inner.read();
        Ok(inner
            .tasks
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_task(&self, user_id: &str, task_id: Uuid) -> Result<Option<Task>, RepositoryError> {
        let inner = self.inner.read();
        Ok(inner.tasks.get(&task_id).and_then(|t| owned_by(t, user_id)).cloned())
    }

    async fn create_task(
        &self,
        user_id: &str,
        title: &str,
        description: Option<String>,
        completed: bool,
    ) -> Result<Task, RepositoryError> {
        model::validate_title(title)?;
        if let Some(ref desc) = description {
            model::validate_description(desc)?;
        }
        let mut task = Task::new(user_id, title, description);
        task.completed = completed;
        self.inner.write().tasks.insert(task.task_id, task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        user_id: &str,
        task_id: Uuid,
        patch: TaskPatch,
    ) -> Result<Option<Task>, RepositoryError> {
        if let Some(ref title) = patch.title {
            model::validate_title(title)?;
        }
        if let Some(Some(ref desc)) = patch.description {
            model::validate_description(desc)?;
        }

        let mut inner = self.inner.write();
        let Some(task) = inner.tasks.get_mut(&task_id) else {
            return Ok(None);
        };
        if task.user_id != user_id {
            return Ok(None);
        }
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        task.updated_at = chrono::Utc::now();
        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, user_id: &str, task_id: Uuid) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write();
        let owns = inner
            .tasks
            .get(&task_id)
            .map(|t| t.user_id == user_id)
            .unwrap_or(false);
        if !owns {
            return Ok(false);
        }
        inner.notes.remove(&task_id);
        inner.tasks.remove(&task_id);
        Ok(true)
    }

    async fn list_notes(
        &self,
        user_id: &str,
        task_id: Uuid,
        limit: i32,
    ) -> Result<Vec<Note>, RepositoryError> {
        let inner = self.inner.read();
        let owns = inner
            .tasks
            .get(&task_id)
            .map(|t| t.user_id == user_id)
            .unwrap_or(false);
        if !owns {
            return Ok(Vec::new());
        }
        Ok(inner
            .notes
            .get(&task_id)
            .map(|notes| notes.iter().take(limit.max(0) as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn create_note(
        &self,
        user_id: &str,
        task_id: Uuid,
        content: &str,
    ) -> Result<Option<Note>, RepositoryError> {
        model::validate_note_content(content)?;
        let mut inner = self.inner.write();
        let owns = inner
            .tasks
            .get(&task_id)
            .map(|t| t.user_id == user_id)
            .unwrap_or(false);
        if !owns {
            return Ok(None);
        }
        let note = Note::new(user_id, task_id, content);
        inner.notes.entry(task_id).or_default().push(note.clone());
        Ok(Some(note))
    }

    async fn delete_note(
        &self,
        user_id: &str,
        task_id: Uuid,
        note_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write();
        let owns = inner
            .tasks
            .get(&task_id)
            .map(|t| t.user_id == user_id)
            .unwrap_or(false);
        if !owns {
            return Ok(false);
        }
        let Some(notes) = inner.notes.get_mut(&task_id) else {
            return Ok(false);
        };
        let before = notes.len();
        notes.retain(|n| n.note_id != note_id);
        Ok(notes.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_list_tasks_are_scoped_per_user() {
        let repo = InMemoryTaskRepository::new();
        repo.create_task("alice", "Buy milk", None, false).await.unwrap();
        repo.create_task("bob", "Buy eggs", None, false).await.unwrap();

        let alice_tasks = repo.list_tasks("alice").await.unwrap();
        assert_eq!(alice_tasks.len(), 1);
        assert_eq!(alice_tasks[0].title, "Buy milk");
    }

    #[tokio::test]
    async fn delete_task_cascades_to_notes() {
        let repo = InMemoryTaskRepository::new();
        let task = repo.create_task("alice", "Buy milk", None, false).await.unwrap();
        repo.create_note("alice", task.task_id, "2%").await.unwrap();

        assert!(repo.delete_task("alice", task.task_id).await.unwrap());
        assert!(repo.list_notes("alice", task.task_id, 100).await.unwrap().is_empty());
        assert!(repo.get_task("alice", task.task_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_task_rejects_oversized_description() {
        let repo = InMemoryTaskRepository::new();
        let result = repo
            .create_task("alice", "x", Some("y".repeat(2000)), false)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn cross_user_access_is_denied() {
        let repo = InMemoryTaskRepository::new();
        let task = repo.create_task("alice", "Buy milk", None, false).await.unwrap();
        assert!(repo.get_task("bob", task.task_id).await.unwrap().is_none());
        assert!(!repo.delete_task("bob", task.task_id).await.unwrap());
    }
}
