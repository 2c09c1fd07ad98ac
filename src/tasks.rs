//! Task CRUD scoped to the authenticated caller.
//!
//! Every method takes a [`CallerId`], which only the auth service can produce, and
//! hands its owner id to the store alongside any task id. A task owned by someone
//! else therefore looks exactly like a missing one: `TaskNotFound`, never 403.

use std::sync::Arc;
use validator::Validate;

use crate::auth::CallerId;
use crate::clock::Clock;
use crate::error::AppError;
use crate::models::{CreateTaskRequest, Task, TaskQuery, UpdateTaskRequest};
use crate::store::TaskStore;

pub struct TaskService {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create(&self, caller: &CallerId, input: CreateTaskRequest) -> Result<Task, AppError> {
        input.validate()?;
        let new_task = input.into_new_task(caller.as_str(), self.clock.now());
        let task = self.store.insert_task(new_task).await?;
        log::info!("User {} created task {}", caller, task.id);
        Ok(task)
    }

    /// Lists the caller's tasks, ascending by id unless `order=desc` was asked for.
    pub async fn list(&self, caller: &CallerId, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        let filter = query.status.unwrap_or_default().into();
        let order = query.order.unwrap_or_default().into();
        let tasks = self.store.list_tasks(caller.as_str(), filter, order).await?;
        Ok(tasks)
    }

    pub async fn get(&self, caller: &CallerId, task_id: i64) -> Result<Task, AppError> {
        self.store
            .find_task(caller.as_str(), task_id)
            .await?
            .ok_or(AppError::TaskNotFound(task_id))
    }

    /// Applies the supplied fields. At least one must be present.
    pub async fn update(
        &self,
        caller: &CallerId,
        task_id: i64,
        input: UpdateTaskRequest,
    ) -> Result<Task, AppError> {
        if input.is_empty() {
            return Err(AppError::NoFieldsProvided);
        }
        input.validate()?;

        let changes = input.into_changes(self.clock.now());
        let task = self
            .store
            .update_task(caller.as_str(), task_id, changes)
            .await?
            .ok_or(AppError::TaskNotFound(task_id))?;
        log::info!("User {} updated task {}", caller, task.id);
        Ok(task)
    }

    /// Permanently removes the task.
    pub async fn delete(&self, caller: &CallerId, task_id: i64) -> Result<(), AppError> {
        if !self.store.delete_task(caller.as_str(), task_id).await? {
            return Err(AppError::TaskNotFound(task_id));
        }
        log::info!("User {} deleted task {}", caller, task_id);
        Ok(())
    }

    pub async fn toggle_complete(&self, caller: &CallerId, task_id: i64) -> Result<Task, AppError> {
        let task = self
            .store
            .toggle_task(caller.as_str(), task_id, self.clock.now())
            .await?
            .ok_or(AppError::TaskNotFound(task_id))?;
        log::info!(
            "User {} marked task {} as {}",
            caller,
            task.id,
            if task.completed { "completed" } else { "pending" }
        );
        Ok(task)
    }
}
