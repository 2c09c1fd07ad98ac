//! Persistence contracts for users and tasks.
//!
//! The services only ever talk to these traits. Two implementations ship with the
//! crate: [`MemoryStore`] for tests and database-less runs, and [`PgStore`] over a
//! `sqlx` Postgres pool.
//!
//! # Invariants
//! - Every id-addressed task operation keys on `(task_id, owner_id)`. A row owned by
//!   someone else is indistinguishable from a missing row (`None` / `false`).
//! - Each mutating call is one atomic row operation; no multi-row transactions.
//! - Stores never move `updated_at` below `created_at`.
//! - Emails reach the credential store already normalized to lowercase.

pub mod memory;
pub mod postgres;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::fmt;

use crate::models::{Task, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Failure reported by a store backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    Conflict(String),
    /// The backend could not be reached (pool exhausted, connection refused).
    Unavailable(String),
    /// Any other backend failure.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::Conflict(msg) => write!(f, "conflict: {}", msg),
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            StoreError::Backend(msg) => write!(f, "store failure: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

/// Completion filter applied when listing tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl CompletionFilter {
    /// `Some(flag)` when rows must have `completed == flag`.
    pub fn completed(self) -> Option<bool> {
        match self {
            CompletionFilter::All => None,
            CompletionFilter::Pending => Some(false),
            CompletionFilter::Completed => Some(true),
        }
    }
}

/// Row ordering for task listings. Ties never occur because ids are unique.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListOrder {
    #[default]
    IdAscending,
    IdDescending,
}

/// A validated task ready to be inserted; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Field changes applied by [`TaskStore::update_task`]. `None` leaves the column as is.
#[derive(Debug, Clone)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

/// Persistent table of tasks, each owned by exactly one user.
pub trait TaskStore: Send + Sync {
    /// Inserts a task with `completed = false` and `updated_at = created_at`.
    fn insert_task(&self, task: NewTask) -> BoxFuture<'_, StoreResult<Task>>;

    /// Lists the owner's tasks.
    fn list_tasks<'a>(
        &'a self,
        owner_id: &'a str,
        filter: CompletionFilter,
        order: ListOrder,
    ) -> BoxFuture<'a, StoreResult<Vec<Task>>>;

    fn find_task<'a>(&'a self, owner_id: &'a str, task_id: i64)
        -> BoxFuture<'a, StoreResult<Option<Task>>>;

    /// Applies `changes` and returns the updated row.
    fn update_task<'a>(
        &'a self,
        owner_id: &'a str,
        task_id: i64,
        changes: TaskChanges,
    ) -> BoxFuture<'a, StoreResult<Option<Task>>>;

    /// Flips `completed` in place and returns the updated row.
    fn toggle_task<'a>(
        &'a self,
        owner_id: &'a str,
        task_id: i64,
        updated_at: DateTime<Utc>,
    ) -> BoxFuture<'a, StoreResult<Option<Task>>>;

    /// Removes the row permanently. Returns whether a row was removed.
    fn delete_task<'a>(&'a self, owner_id: &'a str, task_id: i64) -> BoxFuture<'a, StoreResult<bool>>;
}

/// Persistent user records.
pub trait CredentialStore: Send + Sync {
    /// Inserts a user. Fails with [`StoreError::Conflict`] when the email is taken.
    fn insert_user(&self, user: User) -> BoxFuture<'_, StoreResult<User>>;

    /// Looks up a user by normalized email.
    fn find_user_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, StoreResult<Option<User>>>;
}
