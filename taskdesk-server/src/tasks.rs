//! In-memory owner-scoped task table.
//!
//! The [`TaskTable`] holds each owner's tasks ordered newest first. Every
//! operation takes the requesting owner and only touches that owner's
//! rows; an id owned by someone else behaves exactly like a missing id,
//! so ids cannot be probed across owners.

use std::collections::HashMap;

use taskdesk_proto::task::{Task, TaskDraft, TaskId, TaskPage, TaskPatch, Timestamp};
use taskdesk_proto::user::OwnerId;
use tokio::sync::RwLock;

/// Default ceiling applied to client-supplied page sizes.
const DEFAULT_MAX_PER_PAGE: u32 = 100;

/// Error returned when an operation targets a task that does not exist
/// under the requesting owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("task not found")]
pub struct TaskNotFound;

/// In-memory per-owner task lists, newest first.
///
/// Thread-safe via [`RwLock`]. Each owner has an independent list kept in
/// `created_at`-descending order; new tasks are inserted at the front.
pub struct TaskTable {
    rows: RwLock<HashMap<OwnerId, Vec<Task>>>,
    max_per_page: u32,
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskTable {
    /// Creates a new, empty task table with the default page size ceiling.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            max_per_page: DEFAULT_MAX_PER_PAGE,
        }
    }

    /// Creates a new, empty task table with a custom page size ceiling.
    #[must_use]
    pub fn with_max_per_page(max_per_page: u32) -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            max_per_page: max_per_page.max(1),
        }
    }

    /// Inserts a new task for the given owner and returns the full record.
    ///
    /// The table assigns the id, stamps both timestamps, and forces
    /// `completed` to start false, whatever the draft says.
    pub async fn insert(&self, owner: OwnerId, draft: TaskDraft) -> Task {
        let now = Timestamp::now();
        let task = Task {
            id: TaskId::new(),
            owner,
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            due_date: draft.due_date,
            completed: false,
            created_at: now,
            updated_at: now,
        };
        let mut rows = self.rows.write().await;
        rows.entry(owner).or_default().insert(0, task.clone());
        drop(rows);
        task
    }

    /// Returns one page of the owner's tasks, newest first.
    ///
    /// Pages are 1-based; page 0 is treated as page 1. `per_page` is
    /// clamped to `1..=max_per_page`. A page past the end yields an empty
    /// slice with the correct total.
    #[allow(clippy::cast_possible_truncation)]
    pub async fn page(&self, owner: OwnerId, page: u32, per_page: u32) -> TaskPage {
        let page = page.max(1);
        // Safe: per_page is clamped to the ceiling and page offsets stay
        // far below usize::MAX on supported targets.
        let per_page = per_page.clamp(1, self.max_per_page) as usize;
        let start = (page as usize - 1) * per_page;

        let rows = self.rows.read().await;
        let list = rows.get(&owner);
        let total_count = list.map_or(0, |l| u64::try_from(l.len()).unwrap_or(u64::MAX));
        let tasks = list.map_or_else(Vec::new, |l| {
            l.iter().skip(start).take(per_page).cloned().collect()
        });
        drop(rows);
        TaskPage { tasks, total_count }
    }

    /// Applies a patch to one of the owner's tasks and refreshes
    /// `updated_at`, returning the record after the change.
    ///
    /// # Errors
    ///
    /// Returns [`TaskNotFound`] if the id does not exist under this owner.
    pub async fn update(
        &self,
        owner: OwnerId,
        id: TaskId,
        patch: &TaskPatch,
    ) -> Result<Task, TaskNotFound> {
        let mut rows = self.rows.write().await;
        let Some(list) = rows.get_mut(&owner) else {
            return Err(TaskNotFound);
        };
        let Some(task) = list.iter_mut().find(|t| t.id == id) else {
            return Err(TaskNotFound);
        };
        patch.apply(task);
        task.updated_at = Timestamp::now();
        let updated = task.clone();
        drop(rows);
        Ok(updated)
    }

    /// Permanently removes one of the owner's tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskNotFound`] if the id does not exist under this owner.
    pub async fn delete(&self, owner: OwnerId, id: TaskId) -> Result<(), TaskNotFound> {
        let mut rows = self.rows.write().await;
        let Some(list) = rows.get_mut(&owner) else {
            return Err(TaskNotFound);
        };
        let Some(index) = list.iter().position(|t| t.id == id) else {
            return Err(TaskNotFound);
        };
        list.remove(index);
        drop(rows);
        Ok(())
    }
}
