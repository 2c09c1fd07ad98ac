use crate::{
    auth::AuthorizedOwner,
    error::AppError,
    models::{CreateTaskRequest, TaskQuery, UpdateTaskRequest},
    tasks::TaskService,
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};

/// `(owner_id, task_id)`. The owner segment is checked by [`AuthorizedOwner`];
/// a non-integer task id fails extraction with 400.
pub type TaskPath = web::Path<(String, i64)>;

fn task_id(path: TaskPath) -> i64 {
    path.into_inner().1
}

/// Lists the caller's tasks.
///
/// ## Query Parameters:
/// - `status` (optional): `all` (default), `pending` or `completed`.
/// - `order` (optional): `asc` (default) or `desc`, by task id.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Task` objects, possibly empty.
/// - `401 Unauthorized`: Missing, malformed or expired token.
/// - `403 Forbidden`: The path names another user.
#[get("")]
pub async fn list_tasks(
    tasks: web::Data<TaskService>,
    owner: AuthorizedOwner,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let listed = tasks.list(owner.caller(), &query).await?;
    Ok(HttpResponse::Ok().json(listed))
}

/// Creates a task owned by the caller.
///
/// ## Responses:
/// - `201 Created`: The new `Task`, with `completed = false`.
/// - `422 Unprocessable Entity`: `INVALID_TITLE` or `INVALID_DESCRIPTION`.
#[post("")]
pub async fn create_task(
    tasks: web::Data<TaskService>,
    owner: AuthorizedOwner,
    task_data: web::Json<CreateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let task = tasks.create(owner.caller(), task_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Fetches one task. Tasks of other users answer 404, like missing ones.
#[get("/{task_id}")]
pub async fn get_task(
    tasks: web::Data<TaskService>,
    owner: AuthorizedOwner,
    path: TaskPath,
) -> Result<impl Responder, AppError> {
    let task = tasks.get(owner.caller(), task_id(path)).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Partially updates a task.
///
/// ## Request Body:
/// Any of `title`, `description`, `completed`. An empty object is rejected
/// with `422 NO_FIELDS_PROVIDED`.
#[put("/{task_id}")]
pub async fn update_task(
    tasks: web::Data<TaskService>,
    owner: AuthorizedOwner,
    path: TaskPath,
    task_data: web::Json<UpdateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let task = tasks
        .update(owner.caller(), task_id(path), task_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task permanently. Answers `204 No Content`.
#[delete("/{task_id}")]
pub async fn delete_task(
    tasks: web::Data<TaskService>,
    owner: AuthorizedOwner,
    path: TaskPath,
) -> Result<impl Responder, AppError> {
    tasks.delete(owner.caller(), task_id(path)).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Flips the task's `completed` flag.
#[patch("/{task_id}/complete")]
pub async fn toggle_task(
    tasks: web::Data<TaskService>,
    owner: AuthorizedOwner,
    path: TaskPath,
) -> Result<impl Responder, AppError> {
    let task = tasks.toggle_complete(owner.caller(), task_id(path)).await?;
    Ok(HttpResponse::Ok().json(task))
}
