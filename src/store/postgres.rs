use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use super::{
    CompletionFilter, CredentialStore, ListOrder, NewTask, StoreError, StoreResult, TaskChanges,
    TaskStore,
};
use crate::models::{Task, User};

const TASK_COLUMNS: &str = "id, user_id, title, description, completed, created_at, updated_at";

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        name TEXT,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS tasks (
        id BIGSERIAL PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title TEXT NOT NULL CHECK (char_length(title) BETWEEN 1 AND 200),
        description TEXT NOT NULL DEFAULT '' CHECK (char_length(description) <= 1000),
        completed BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        CHECK (updated_at >= created_at)
    )",
    "CREATE INDEX IF NOT EXISTS idx_tasks_user_id ON tasks (user_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_user_completed ON tasks (user_id, completed)",
];

/// Classifies `sqlx` failures: unique violations become conflicts, pool and
/// connection failures become unavailability, everything else is a backend error.
impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> StoreError {
        match &error {
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                StoreError::Conflict(db_error.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(error.to_string())
            }
            _ => StoreError::Backend(error.to_string()),
        }
    }
}

/// Pool settings for [`PgStore::connect`].
#[derive(Debug, Clone)]
pub struct PgSettings {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

/// Postgres-backed store over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(settings: &PgSettings) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .test_before_acquire(true)
            .connect(&settings.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Creates tables and indexes when missing. Safe to run on every start.
    pub async fn init_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        log::info!("Database schema is ready");
        Ok(())
    }
}

impl TaskStore for PgStore {
    fn insert_task(&self, task: NewTask) -> BoxFuture<'_, StoreResult<Task>> {
        async move {
            let sql = format!(
                "INSERT INTO tasks (user_id, title, description, completed, created_at, updated_at)
                 VALUES ($1, $2, $3, FALSE, $4, $4)
                 RETURNING {}",
                TASK_COLUMNS
            );
            let row = sqlx::query_as::<_, Task>(&sql)
                .bind(task.owner_id)
                .bind(task.title)
                .bind(task.description)
                .bind(task.created_at)
                .fetch_one(&self.pool)
                .await?;
            Ok(row)
        }
        .boxed()
    }

    fn list_tasks<'a>(
        &'a self,
        owner_id: &'a str,
        filter: CompletionFilter,
        order: ListOrder,
    ) -> BoxFuture<'a, StoreResult<Vec<Task>>> {
        async move {
            let direction = match order {
                ListOrder::IdAscending => "ASC",
                ListOrder::IdDescending => "DESC",
            };
            let sql = format!(
                "SELECT {} FROM tasks
                 WHERE user_id = $1 AND ($2::BOOLEAN IS NULL OR completed = $2)
                 ORDER BY id {}",
                TASK_COLUMNS, direction
            );
            let rows = sqlx::query_as::<_, Task>(&sql)
                .bind(owner_id)
                .bind(filter.completed())
                .fetch_all(&self.pool)
                .await?;
            Ok(rows)
        }
        .boxed()
    }

    fn find_task<'a>(
        &'a self,
        owner_id: &'a str,
        task_id: i64,
    ) -> BoxFuture<'a, StoreResult<Option<Task>>> {
        async move {
            let sql = format!(
                "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
                TASK_COLUMNS
            );
            let row = sqlx::query_as::<_, Task>(&sql)
                .bind(task_id)
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }
        .boxed()
    }

    fn update_task<'a>(
        &'a self,
        owner_id: &'a str,
        task_id: i64,
        changes: TaskChanges,
    ) -> BoxFuture<'a, StoreResult<Option<Task>>> {
        async move {
            let sql = format!(
                "UPDATE tasks
                 SET title = COALESCE($3, title),
                     description = COALESCE($4, description),
                     completed = COALESCE($5, completed),
                     updated_at = GREATEST($6, created_at)
                 WHERE id = $1 AND user_id = $2
                 RETURNING {}",
                TASK_COLUMNS
            );
            let row = sqlx::query_as::<_, Task>(&sql)
                .bind(task_id)
                .bind(owner_id)
                .bind(changes.title)
                .bind(changes.description)
                .bind(changes.completed)
                .bind(changes.updated_at)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }
        .boxed()
    }

    fn toggle_task<'a>(
        &'a self,
        owner_id: &'a str,
        task_id: i64,
        updated_at: DateTime<Utc>,
    ) -> BoxFuture<'a, StoreResult<Option<Task>>> {
        async move {
            let sql = format!(
                "UPDATE tasks
                 SET completed = NOT completed,
                     updated_at = GREATEST($3, created_at)
                 WHERE id = $1 AND user_id = $2
                 RETURNING {}",
                TASK_COLUMNS
            );
            let row = sqlx::query_as::<_, Task>(&sql)
                .bind(task_id)
                .bind(owner_id)
                .bind(updated_at)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }
        .boxed()
    }

    fn delete_task<'a>(&'a self, owner_id: &'a str, task_id: i64) -> BoxFuture<'a, StoreResult<bool>> {
        async move {
            let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
                .bind(task_id)
                .bind(owner_id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        }
        .boxed()
    }
}

impl CredentialStore for PgStore {
    fn insert_user(&self, user: User) -> BoxFuture<'_, StoreResult<User>> {
        async move {
            let row = sqlx::query_as::<_, User>(
                "INSERT INTO users (id, email, name, password_hash, created_at)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id, email, name, password_hash, created_at",
            )
            .bind(&user.id)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await?;
            Ok(row)
        }
        .boxed()
    }

    fn find_user_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, StoreResult<Option<User>>> {
        async move {
            let row = sqlx::query_as::<_, User>(
                "SELECT id, email, name, password_hash, created_at FROM users WHERE email = $1",
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }
        .boxed()
    }
}
