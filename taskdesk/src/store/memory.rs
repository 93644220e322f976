//! In-process store used by tests.
//!
//! Mirrors the server's storage semantics (owner scoping, newest-first
//! ordering, page clamping) without any networking, and can be told to
//! fail its next operation to drive error paths.

use std::collections::HashMap;

use taskdesk_proto::task::{Task, TaskDraft, TaskId, TaskPage, TaskPatch, Timestamp};
use taskdesk_proto::user::OwnerId;

use crate::store::{StoreError, TaskStore};

/// How the next operation on a [`MemoryStore`] should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Report the caller as unauthenticated.
    Unauthorized,
    /// Report the target task as missing.
    NotFound,
    /// Report a generic backend failure.
    Backend,
}

/// In-memory task store keyed by owner.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: tokio::sync::RwLock<HashMap<OwnerId, Vec<Task>>>,
    fail_next: tokio::sync::Mutex<Option<FailureMode>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next store operation fail with the given mode.
    ///
    /// The failure is consumed by that one operation; later calls succeed
    /// again.
    pub async fn fail_next(&self, mode: FailureMode) {
        *self.fail_next.lock().await = Some(mode);
    }

    /// Number of tasks currently stored for the owner.
    pub async fn task_count(&self, owner: OwnerId) -> usize {
        self.rows
            .read()
            .await
            .get(&owner)
            .map_or(0, std::vec::Vec::len)
    }

    async fn take_failure(&self) -> Result<(), StoreError> {
        let mode = self.fail_next.lock().await.take();
        match mode {
            None => Ok(()),
            Some(FailureMode::Unauthorized) => Err(StoreError::Unauthorized),
            Some(FailureMode::NotFound) => Err(StoreError::NotFound),
            Some(FailureMode::Backend) => Err(StoreError::Rejected {
                reason: "simulated backend failure".to_string(),
            }),
        }
    }
}

impl TaskStore for MemoryStore {
    #[allow(clippy::cast_possible_truncation)]
    async fn fetch_page(
        &self,
        owner: OwnerId,
        page: u32,
        per_page: u32,
    ) -> Result<TaskPage, StoreError> {
        self.take_failure().await?;

        let rows = self.rows.read().await;
        let all = rows.get(&owner).map(Vec::as_slice).unwrap_or_default();

        let page = page.max(1);
        let per_page = per_page.max(1);
        // Safe: page and per_page are u32, so the product fits in usize
        // on the platforms this runs on.
        let start = ((page - 1) as usize) * (per_page as usize);
        let tasks = all
            .iter()
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect();

        Ok(TaskPage {
            tasks,
            total_count: all.len() as u64,
        })
    }

    async fn create(&self, owner: OwnerId, draft: &TaskDraft) -> Result<Task, StoreError> {
        self.take_failure().await?;

        let now = Timestamp::now();
        let task = Task {
            id: TaskId::new(),
            owner,
            title: draft.title.clone(),
            description: draft.description.clone(),
            priority: draft.priority,
            due_date: draft.due_date,
            completed: false,
            created_at: now,
            updated_at: now,
        };

        let mut rows = self.rows.write().await;
        rows.entry(owner).or_default().insert(0, task.clone());
        Ok(task)
    }

    async fn update(
        &self,
        owner: OwnerId,
        id: TaskId,
        patch: &TaskPatch,
    ) -> Result<Task, StoreError> {
        self.take_failure().await?;

        let mut rows = self.rows.write().await;
        let tasks = rows.get_mut(&owner).ok_or(StoreError::NotFound)?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound)?;

        patch.apply(task);
        task.updated_at = Timestamp::now();
        Ok(task.clone())
    }

    async fn delete(&self, owner: OwnerId, id: TaskId) -> Result<(), StoreError> {
        self.take_failure().await?;

        let mut rows = self.rows.write().await;
        let tasks = rows.get_mut(&owner).ok_or(StoreError::NotFound)?;
        let position = tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound)?;
        tasks.remove(position);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
