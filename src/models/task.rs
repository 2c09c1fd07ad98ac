use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use crate::store::{CompletionFilter, ListOrder, NewTask, TaskChanges};

/// Maximum title length in Unicode code points, measured after trimming.
pub const TITLE_MAX_CHARS: usize = 200;
/// Maximum description length in Unicode code points.
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// Represents a task entity as stored and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Store-assigned identifier, unique across all users.
    pub id: i64,
    /// Identifier of the user who owns the task. Never changes.
    pub user_id: String,
    /// Trimmed title, 1 to 200 characters.
    pub title: String,
    /// Free-form description, empty when none was given.
    pub description: String,
    pub completed: bool,
    #[serde(with = "crate::timestamp::utc_z")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::timestamp::utc_z")]
    pub updated_at: DateTime<Utc>,
}

/// Rejects titles that are blank or longer than [`TITLE_MAX_CHARS`] once trimmed.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let length = title.trim().chars().count();
    if length == 0 || length > TITLE_MAX_CHARS {
        let mut error = ValidationError::new("title_length");
        error.message = Some("Title must be between 1 and 200 characters".into());
        return Err(error);
    }
    Ok(())
}

/// Rejects descriptions longer than [`DESCRIPTION_MAX_CHARS`].
pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        let mut error = ValidationError::new("description_length");
        error.message = Some("Description must be at most 1000 characters".into());
        return Err(error);
    }
    Ok(())
}

/// Payload for `POST /{owner_id}/tasks`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskRequest {
    #[validate(custom = "validate_title")]
    pub title: String,
    #[validate(custom = "validate_description")]
    pub description: Option<String>,
}

impl CreateTaskRequest {
    /// Builds the row to insert. Callers validate first.
    pub fn into_new_task(self, owner_id: &str, now: DateTime<Utc>) -> NewTask {
        NewTask {
            owner_id: owner_id.to_string(),
            title: self.title.trim().to_string(),
            description: self.description.unwrap_or_default(),
            created_at: now,
        }
    }
}

/// Payload for `PUT /{owner_id}/tasks/{id}`. Omitted (or `null`) fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskRequest {
    #[validate(custom = "validate_title")]
    pub title: Option<String>,
    #[validate(custom = "validate_description")]
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl UpdateTaskRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }

    pub fn into_changes(self, now: DateTime<Utc>) -> TaskChanges {
        TaskChanges {
            title: self.title.map(|title| title.trim().to_string()),
            description: self.description,
            completed: self.completed,
            updated_at: now,
        }
    }
}

/// `status` query parameter of the list endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl From<StatusFilter> for CompletionFilter {
    fn from(status: StatusFilter) -> Self {
        match status {
            StatusFilter::All => CompletionFilter::All,
            StatusFilter::Pending => CompletionFilter::Pending,
            StatusFilter::Completed => CompletionFilter::Completed,
        }
    }
}

/// `order` query parameter of the list endpoint, applied to task ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl From<SortOrder> for ListOrder {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => ListOrder::IdAscending,
            SortOrder::Desc => ListOrder::IdDescending,
        }
    }
}

/// Query parameters accepted when listing tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskQuery {
    pub status: Option<StatusFilter>,
    pub order: Option<SortOrder>,
}
