//! Task collaborator interface and the `/api/tasks` handlers.
//!
//! Every route here is guarded: by the time a handler runs, the auth guard
//! has attached an [`Identity`] to the request. All store operations are
//! keyed by that identity, so one subject can never see or touch another's
//! tasks — a foreign task id behaves exactly like a missing one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::app::State;
use crate::auth::Identity;
use crate::error::Failure;
use crate::request::Request;
use crate::response::Response;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub done: bool,
}

/// Client-supplied task fields, for both create and update.
#[derive(Debug, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

/// The external task-storage collaborator. CRUD keyed by owner + task id.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list(&self, owner: &Identity) -> Result<Vec<Task>, Failure>;
    async fn create(&self, owner: &Identity, draft: TaskDraft) -> Result<Task, Failure>;
    async fn get(&self, owner: &Identity, id: &str) -> Result<Task, Failure>;
    async fn update(&self, owner: &Identity, id: &str, draft: TaskDraft) -> Result<Task, Failure>;
    async fn remove(&self, owner: &Identity, id: &str) -> Result<(), Failure>;
}

/// The identity the guard attached. Its absence on a guarded route would be
/// a pipeline bug, so it maps to `Internal`, not `Unauthorized`.
fn owner(req: &Request) -> Result<Identity, Failure> {
    req.identity()
        .cloned()
        .ok_or_else(|| Failure::internal("guarded route reached without an identity"))
}

fn task_id<'r>(req: &'r Request) -> Result<&'r str, Failure> {
    req.param("id")
        .ok_or_else(|| Failure::internal("route pattern is missing the `id` parameter"))
}

/// `GET /api/tasks` → 200 with the owner's tasks.
pub async fn list(state: State, req: Request) -> Result<Response, Failure> {
    let owner = owner(&req)?;
    let tasks = state.tasks.list(&owner).await?;
    Response::json(&tasks)
}

/// `POST /api/tasks` → 201 with the created task.
pub async fn create(state: State, req: Request) -> Result<Response, Failure> {
    let owner = owner(&req)?;
    let draft: TaskDraft = req.json()?;
    let task = state.tasks.create(&owner, draft).await?;
    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", &format!("/api/tasks/{}", task.id))
        .json(&task)
}

/// `GET /api/tasks/{id}` → 200 with one task.
pub async fn get(state: State, req: Request) -> Result<Response, Failure> {
    let owner = owner(&req)?;
    let task = state.tasks.get(&owner, task_id(&req)?).await?;
    Response::json(&task)
}

/// `PUT /api/tasks/{id}` → 200 with the updated task.
pub async fn update(state: State, req: Request) -> Result<Response, Failure> {
    let owner = owner(&req)?;
    let draft: TaskDraft = req.json()?;
    let task = state.tasks.update(&owner, task_id(&req)?, draft).await?;
    Response::json(&task)
}

/// `DELETE /api/tasks/{id}` → 204.
pub async fn remove(state: State, req: Request) -> Result<Response, Failure> {
    let owner = owner(&req)?;
    state.tasks.remove(&owner, task_id(&req)?).await?;
    Ok(Response::status(StatusCode::NO_CONTENT))
}

/// In-memory [`TaskStore`] for dev and tests. Tasks bucketed per subject.
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<String, Vec<Task>>>,
    next_id: AtomicU64,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self { tasks: RwLock::new(HashMap::new()), next_id: AtomicU64::new(1) }
    }
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list(&self, owner: &Identity) -> Result<Vec<Task>, Failure> {
        let tasks = self.tasks.read().unwrap_or_else(|e| e.into_inner());
        Ok(tasks.get(&owner.subject).cloned().unwrap_or_default())
    }

    async fn create(&self, owner: &Identity, draft: TaskDraft) -> Result<Task, Failure> {
        let task = Task {
            id: self.next_id.fetch_add(1, Ordering::Relaxed).to_string(),
            title: draft.title,
            done: draft.done,
        };

        let mut tasks = self.tasks.write().unwrap_or_else(|e| e.into_inner());
        tasks.entry(owner.subject.clone()).or_default().push(task.clone());
        Ok(task)
    }

    async fn get(&self, owner: &Identity, id: &str) -> Result<Task, Failure> {
        let tasks = self.tasks.read().unwrap_or_else(|e| e.into_inner());
        tasks
            .get(&owner.subject)
            .and_then(|bucket| bucket.iter().find(|t| t.id == id))
            .cloned()
            .ok_or_else(Failure::not_found)
    }

    async fn update(&self, owner: &Identity, id: &str, draft: TaskDraft) -> Result<Task, Failure> {
        let mut tasks = self.tasks.write().unwrap_or_else(|e| e.into_inner());
        let task = tasks
            .get_mut(&owner.subject)
            .and_then(|bucket| bucket.iter_mut().find(|t| t.id == id))
            .ok_or_else(Failure::not_found)?;

        task.title = draft.title;
        task.done = draft.done;
        Ok(task.clone())
    }

    async fn remove(&self, owner: &Identity, id: &str) -> Result<(), Failure> {
        let mut tasks = self.tasks.write().unwrap_or_else(|e| e.into_inner());
        let bucket = tasks.get_mut(&owner.subject).ok_or_else(Failure::not_found)?;

        let before = bucket.len();
        bucket.retain(|t| t.id != id);
        if bucket.len() == before {
            return Err(Failure::not_found());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> TaskDraft {
        TaskDraft { title: title.to_owned(), done: false }
    }

    #[tokio::test]
    async fn create_then_get_roundtrip() {
        let store = MemoryTaskStore::new();
        let alice = Identity::new("user-1");

        let created = store.create(&alice, draft("water the plants")).await.unwrap();
        let fetched = store.get(&alice, &created.id).await.unwrap();
        assert_eq!(created, fetched);
    }

    #[tokio::test]
    async fn tasks_are_isolated_per_owner() {
        let store = MemoryTaskStore::new();
        let alice = Identity::new("user-1");
        let bob = Identity::new("user-2");

        let task = store.create(&alice, draft("private")).await.unwrap();

        assert!(matches!(store.get(&bob, &task.id).await, Err(Failure::NotFound)));
        assert!(store.list(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_the_draft_fields() {
        let store = MemoryTaskStore::new();
        let alice = Identity::new("user-1");
        let task = store.create(&alice, draft("draught")).await.unwrap();

        let updated = store
            .update(&alice, &task.id, TaskDraft { title: "draft".to_owned(), done: true })
            .await
            .unwrap();

        assert_eq!(updated.title, "draft");
        assert!(updated.done);
        assert_eq!(updated.id, task.id);
    }

    #[tokio::test]
    async fn remove_deletes_exactly_one_task() {
        let store = MemoryTaskStore::new();
        let alice = Identity::new("user-1");
        let keep = store.create(&alice, draft("keep")).await.unwrap();
        let gone = store.create(&alice, draft("gone")).await.unwrap();

        store.remove(&alice, &gone.id).await.unwrap();

        assert_eq!(store.list(&alice).await.unwrap(), vec![keep]);
        assert!(matches!(store.remove(&alice, &gone.id).await, Err(Failure::NotFound)));
    }
}
