use chrono::{DateTime, Utc};
use futures::future::{ready, BoxFuture, FutureExt};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::{
    CompletionFilter, CredentialStore, ListOrder, NewTask, StoreError, StoreResult, TaskChanges,
    TaskStore,
};
use crate::models::{Task, User};

#[derive(Debug)]
struct State {
    users_by_email: HashMap<String, User>,
    tasks: BTreeMap<i64, Task>,
    last_task_id: i64,
}

/// Process-local store backing both traits.
///
/// The lock is held only for the span of one row operation, which makes every
/// operation atomic with respect to the others.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                users_by_email: HashMap::new(),
                tasks: BTreeMap::new(),
                last_task_id: 0,
            }),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn with_owned_task<T>(
        &self,
        owner_id: &str,
        task_id: i64,
        apply: impl FnOnce(&mut Task) -> T,
    ) -> StoreResult<Option<T>> {
        let mut state = self.lock()?;
        Ok(state
            .tasks
            .get_mut(&task_id)
            .filter(|task| task.user_id == owner_id)
            .map(apply))
    }
}

fn touch(task: &mut Task, updated_at: DateTime<Utc>) {
    task.updated_at = updated_at.max(task.created_at);
}

impl TaskStore for MemoryStore {
    fn insert_task(&self, new_task: NewTask) -> BoxFuture<'_, StoreResult<Task>> {
        let result = self.lock().map(|mut state| {
            state.last_task_id += 1;
            let task = Task {
                id: state.last_task_id,
                user_id: new_task.owner_id,
                title: new_task.title,
                description: new_task.description,
                completed: false,
                created_at: new_task.created_at,
                updated_at: new_task.created_at,
            };
            state.tasks.insert(task.id, task.clone());
            task
        });
        ready(result).boxed()
    }

    fn list_tasks<'a>(
        &'a self,
        owner_id: &'a str,
        filter: CompletionFilter,
        order: ListOrder,
    ) -> BoxFuture<'a, StoreResult<Vec<Task>>> {
        let result = self.lock().map(|state| {
            let wanted = filter.completed();
            let mut tasks: Vec<Task> = state
                .tasks
                .values()
                .filter(|task| task.user_id == owner_id)
                .filter(|task| wanted.map_or(true, |flag| task.completed == flag))
                .cloned()
                .collect();
            if order == ListOrder::IdDescending {
                tasks.reverse();
            }
            tasks
        });
        ready(result).boxed()
    }

    fn find_task<'a>(
        &'a self,
        owner_id: &'a str,
        task_id: i64,
    ) -> BoxFuture<'a, StoreResult<Option<Task>>> {
        ready(self.with_owned_task(owner_id, task_id, |task| task.clone())).boxed()
    }

    fn update_task<'a>(
        &'a self,
        owner_id: &'a str,
        task_id: i64,
        changes: TaskChanges,
    ) -> BoxFuture<'a, StoreResult<Option<Task>>> {
        let result = self.with_owned_task(owner_id, task_id, |task| {
            if let Some(title) = changes.title {
                task.title = title;
            }
            if let Some(description) = changes.description {
                task.description = description;
            }
            if let Some(completed) = changes.completed {
                task.completed = completed;
            }
            touch(task, changes.updated_at);
            task.clone()
        });
        ready(result).boxed()
    }

    fn toggle_task<'a>(
        &'a self,
        owner_id: &'a str,
        task_id: i64,
        updated_at: DateTime<Utc>,
    ) -> BoxFuture<'a, StoreResult<Option<Task>>> {
        let result = self.with_owned_task(owner_id, task_id, |task| {
            task.completed = !task.completed;
            touch(task, updated_at);
            task.clone()
        });
        ready(result).boxed()
    }

    fn delete_task<'a>(&'a self, owner_id: &'a str, task_id: i64) -> BoxFuture<'a, StoreResult<bool>> {
        let result = self.lock().map(|mut state| {
            let owned = state
                .tasks
                .get(&task_id)
                .map_or(false, |task| task.user_id == owner_id);
            owned && state.tasks.remove(&task_id).is_some()
        });
        ready(result).boxed()
    }
}

impl CredentialStore for MemoryStore {
    fn insert_user(&self, user: User) -> BoxFuture<'_, StoreResult<User>> {
        let result = self.lock().and_then(|mut state| {
            if state.users_by_email.contains_key(&user.email) {
                return Err(StoreError::Conflict(format!("email {} already registered", user.email)));
            }
            state.users_by_email.insert(user.email.clone(), user.clone());
            Ok(user)
        });
        ready(result).boxed()
    }

    fn find_user_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, StoreResult<Option<User>>> {
        let result = self
            .lock()
            .map(|state| state.users_by_email.get(email).cloned());
        ready(result).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 25, 10, minute, 0).unwrap()
    }

    fn new_task(owner: &str, title: &str) -> NewTask {
        NewTask {
            owner_id: owner.to_string(),
            title: title.to_string(),
            description: String::new(),
            created_at: at(0),
        }
    }

    #[actix_rt::test]
    async fn test_ids_are_monotonic_across_owners() {
        let store = MemoryStore::new();
        let first = store.insert_task(new_task("usr_a", "one")).await.unwrap();
        let second = store.insert_task(new_task("usr_b", "two")).await.unwrap();
        let third = store.insert_task(new_task("usr_a", "three")).await.unwrap();
        assert_eq!((first.id, second.id, third.id), (1, 2, 3));
        assert!(!first.completed);
        assert_eq!(first.created_at, first.updated_at);
    }

    #[actix_rt::test]
    async fn test_owner_scoping_hides_foreign_rows() {
        let store = MemoryStore::new();
        let task = store.insert_task(new_task("usr_a", "mine")).await.unwrap();

        assert!(store.find_task("usr_b", task.id).await.unwrap().is_none());
        assert!(store.toggle_task("usr_b", task.id, at(1)).await.unwrap().is_none());
        assert!(!store.delete_task("usr_b", task.id).await.unwrap());

        let changes = TaskChanges {
            title: Some("stolen".into()),
            description: None,
            completed: None,
            updated_at: at(1),
        };
        assert!(store.update_task("usr_b", task.id, changes).await.unwrap().is_none());

        let untouched = store.find_task("usr_a", task.id).await.unwrap().unwrap();
        assert_eq!(untouched, task);
    }

    #[actix_rt::test]
    async fn test_list_filters_and_orders() {
        let store = MemoryStore::new();
        for title in ["a", "b", "c"] {
            store.insert_task(new_task("usr_a", title)).await.unwrap();
        }
        store.insert_task(new_task("usr_b", "other")).await.unwrap();
        store.toggle_task("usr_a", 2, at(1)).await.unwrap();

        let all = store
            .list_tasks("usr_a", CompletionFilter::All, ListOrder::IdAscending)
            .await
            .unwrap();
        assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        let pending = store
            .list_tasks("usr_a", CompletionFilter::Pending, ListOrder::IdDescending)
            .await
            .unwrap();
        assert_eq!(pending.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 1]);

        let completed = store
            .list_tasks("usr_a", CompletionFilter::Completed, ListOrder::IdAscending)
            .await
            .unwrap();
        assert_eq!(completed.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2]);
    }

    #[actix_rt::test]
    async fn test_updated_at_never_precedes_created_at() {
        let store = MemoryStore::new();
        let task = store.insert_task(new_task("usr_a", "t")).await.unwrap();
        let toggled = store
            .toggle_task("usr_a", task.id, task.created_at - Duration::hours(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(toggled.updated_at, toggled.created_at);
    }

    #[actix_rt::test]
    async fn test_delete_is_permanent() {
        let store = MemoryStore::new();
        let task = store.insert_task(new_task("usr_a", "t")).await.unwrap();
        assert!(store.delete_task("usr_a", task.id).await.unwrap());
        assert!(!store.delete_task("usr_a", task.id).await.unwrap());
        assert!(store.find_task("usr_a", task.id).await.unwrap().is_none());

        let next = store.insert_task(new_task("usr_a", "t2")).await.unwrap();
        assert_eq!(next.id, task.id + 1);
    }

    #[actix_rt::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let user = User::new("a@x.com".into(), None, "hash".into(), at(0));
        store.insert_user(user.clone()).await.unwrap();

        let again = User::new("a@x.com".into(), None, "hash2".into(), at(1));
        assert!(matches!(
            store.insert_user(again).await,
            Err(StoreError::Conflict(_))
        ));

        let found = store.find_user_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(store.find_user_by_email("b@x.com").await.unwrap().is_none());
    }
}
