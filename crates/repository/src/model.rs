//! Task/Note data types owned by the repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_DESCRIPTION_LEN: usize = 1024;
pub const MAX_NOTE_CONTENT_LEN: usize = 1024;
pub const MAX_NOTES_LIST_LIMIT: i32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(user_id: &str, title: &str, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            task_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            description,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied to a Task; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub note_id: Uuid,
    pub task_id: Uuid,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn new(user_id: &str, task_id: Uuid, content: &str) -> Self {
        Self {
            note_id: Uuid::new_v4(),
            task_id,
            user_id: user_id.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Validates field lengths per the Task Repository's concrete tools'
/// constraints — enforced here so both the memory and Scylla backends share
/// one check, rather than trusting tool-handler-side validation alone.
pub fn validate_title(title: &str) -> Result<(), crate::RepositoryError> {
    if title.is_empty() {
        return Err(crate::RepositoryError::Validation(
            "Title must not be empty".to_string(),
        ));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(crate::RepositoryError::Validation(format!(
            "Title must not exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), crate::RepositoryError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(crate::RepositoryError::Validation(format!(
            "Description must not exceed {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_note_content(content: &str) -> Result<(), crate::RepositoryError> {
    if content.is_empty() {
        return Err(crate::RepositoryError::Validation(
            "Note content must not be empty".to_string(),
        ));
    }
    if content.chars().count() > MAX_NOTE_CONTENT_LEN {
        return Err(crate::RepositoryError::Validation(format!(
            "Note content must not exceed {MAX_NOTE_CONTENT_LEN} characters"
        )));
    }
    Ok(())
}
