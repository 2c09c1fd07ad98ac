pub mod task;
pub mod user;

pub use task::{CreateTaskRequest, SortOrder, StatusFilter, Task, TaskQuery, UpdateTaskRequest};
pub use user::{User, UserProfile};
