//! ScyllaDB-backed Task Repository — grounded directly on the teacher's
//! `persistence::appointments::ScyllaAppointmentStore` (query construction,
//! positional bind parameters, `row.into_typed` decode).

use crate::client::ScyllaClient;
use crate::error::RepositoryError;
use crate::model::{self, Note, Task, TaskPatch};
use crate::task_repository::TaskRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Clone)]
pub struct ScyllaTaskRepository {
    client: ScyllaClient,
}

impl ScyllaTaskRepository {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    fn row_to_task(&self, row: scylla::frame::response::result::Row) -> Result<Task, RepositoryError> {
        let (user_id, task_id, title, description, completed, created_at, updated_at): (
            String,
            Uuid,
            String,
            Option<String>,
            bool,
            i64,
            i64,
        ) = row
            .into_typed()
            .map_err(|e| RepositoryError::InvalidData(e.to_string()))?;

        Ok(Task {
            task_id,
            user_id,
            title,
            description,
            completed,
            created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_else(Utc::now),
            updated_at: DateTime::from_timestamp_millis(updated_at).unwrap_or_else(Utc::now),
        })
    }

    fn row_to_note(&self, row: scylla::frame::response::result::Row) -> Result<Note, RepositoryError> {
        let (task_id, note_id, user_id, content, created_at): (Uuid, Uuid, String, String, i64) = row
            .into_typed()
            .map_err(|e| RepositoryError::InvalidData(e.to_string()))?;

        Ok(Note {
            note_id,
            task_id,
            user_id,
            content,
            created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_else(Utc::now),
        })
    }
}

#[async_trait]
impl TaskRepository for ScyllaTaskRepository {
    async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, RepositoryError> {
        let query = format!(
            "SELECT user_id, task_id, title, description, completed, created_at, updated_at \
             FROM {}.tasks WHERE user_id = ?",
            self.client.keyspace()
        );
        let result = self.client.session().query_unpaged(query, (user_id,)).await?;

        let mut tasks = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                tasks.push(self.row_to_task(row)?);
            }
        }
        Ok(tasks)
    }

    async fn get_task(&self, user_id: &str, task_id: Uuid) -> Result<Option<Task>, RepositoryError> {
        let query = format!(
            "SELECT user_id, task_id, title, description, completed, created_at, updated_at \
             FROM {}.tasks WHERE user_id = ? AND task_id = ?",
            self.client.keyspace()
        );
        let result = self
            .client
            .session()
            .query_unpaged(query, (user_id, task_id))
            .await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                return Ok(Some(self.row_to_task(row)?));
            }
        }
        Ok(None)
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

        let query = format!(
            "INSERT INTO {}.tasks (user_id, task_id, title, description, completed, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &task.user_id,
                    task.task_id,
                    &task.title,
                    &task.description,
                    task.completed,
                    task.created_at.timestamp_millis(),
                    task.updated_at.timestamp_millis(),
                ),
            )
            .await?;

        tracing::info!(task_id = %task.task_id, user_id = %user_id, "task created");
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

        let Some(mut task) = self.get_task(user_id, task_id).await? else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        task.updated_at = Utc::now();

        let query = format!(
            "UPDATE {}.tasks SET title = ?, description = ?, completed = ?, updated_at = ? \
             WHERE user_id = ? AND task_id = ?",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &task.title,
                    &task.description,
                    task.completed,
                    task.updated_at.timestamp_millis(),
                    user_id,
                    task_id,
                ),
            )
            .await?;

        Ok(Some(task))
    }

    async fn delete_task(&self, user_id: &str, task_id: Uuid) -> Result<bool, RepositoryError> {
        if self.get_task(user_id, task_id).await?.is_none() {
            return Ok(false);
        }

        let delete_notes = format!("DELETE FROM {}.notes WHERE task_id = ?", self.client.keyspace());
        self.client
            .session()
            .query_unpaged(delete_notes, (task_id,))
            .await?;

        let delete_task = format!(
            "DELETE FROM {}.tasks WHERE user_id = ? AND task_id = ?",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(delete_task, (user_id, task_id))
            .await?;

        tracing::info!(task_id = %task_id, user_id = %user_id, "task deleted");
        Ok(true)
    }

    async fn list_notes(
        &self,
        user_id: &str,
        task_id: Uuid,
        limit: i32,
    ) -> Result<Vec<Note>, RepositoryError> {
        if self.get_task(user_id, task_id).await?.is_none() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT task_id, note_id, user_id, content, created_at FROM {}.notes \
             WHERE task_id = ? LIMIT ?",
            self.client.keyspace()
        );
        let result = self
            .client
            .session()
            .query_unpaged(query, (task_id, limit))
            .await?;

        let mut notes = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                notes.push(self.row_to_note(row)?);
            }
        }
        Ok(notes)
    }

    async fn create_note(
        &self,
        user_id: &str,
        task_id: Uuid,
        content: &str,
    ) -> Result<Option<Note>, RepositoryError> {
        model::validate_note_content(content)?;
        if self.get_task(user_id, task_id).await?.is_none() {
            return Ok(None);
        }

        let note = Note::new(user_id, task_id, content);
        let query = format!(
            "INSERT INTO {}.notes (task_id, note_id, user_id, content, created_at) \
             VALUES (?, ?, ?, ?, ?)",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(
                query,
                (
                    note.task_id,
                    note.note_id,
                    &note.user_id,
                    &note.content,
                    note.created_at.timestamp_millis(),
                ),
            )
            .await?;

        Ok(Some(note))
    }

    async fn delete_note(
        &self,
        user_id: &str,
        task_id: Uuid,
        note_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        if self.get_task(user_id, task_id).await?.is_none() {
            return Ok(false);
        }

        let query = format!(
            "DELETE FROM {}.notes WHERE task_id = ? AND note_id = ?",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(query, (task_id, note_id))
            .await?;

        Ok(true)
    }
}
