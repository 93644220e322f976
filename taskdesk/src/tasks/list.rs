//! Paged task list with optimistic updates.
//!
//! [`TaskListManager`] owns the list the user is looking at. Mutations
//! are applied to the visible rows immediately, then confirmed against
//! the store; on failure the previous rows are restored exactly and an
//! error notification is emitted. Outcomes are reported through the
//! notification channel handed out by [`TaskListManager::new`].

use tokio::sync::mpsc;

use taskdesk_proto::task::{Task, TaskDraft, TaskId, TaskPatch, Timestamp};

use crate::notify::{Notification, messages};
use crate::store::TaskStore;
use crate::tasks::actions::TaskActions;

/// What the user currently sees: one page of tasks plus paging totals.
#[derive(Debug, Clone)]
pub struct ListState {
    pub tasks: Vec<Task>,
    pub total_count: u64,
    pub current_page: u32,
    pub is_loading: bool,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            total_count: 0,
            current_page: 1,
            is_loading: false,
        }
    }
}

/// Keeps one page of tasks in sync with the store.
///
/// All mutation of the list happens under one lock, held across the
/// store call, so an optimistic change and its confirmation or rollback
/// are a single step from any observer's point of view.
pub struct TaskListManager<S> {
    actions: TaskActions<S>,
    state: tokio::sync::Mutex<ListState>,
    notice_tx: mpsc::Sender<Notification>,
}

impl<S: TaskStore> TaskListManager<S> {
    /// Create a manager and the receiver for its notifications.
    #[must_use]
    pub fn new(
        actions: TaskActions<S>,
        notice_buffer: usize,
    ) -> (Self, mpsc::Receiver<Notification>) {
        let (notice_tx, notice_rx) = mpsc::channel(notice_buffer);
        let manager = Self {
            actions,
            state: tokio::sync::Mutex::new(ListState::default()),
            notice_tx,
        };
        (manager, notice_rx)
    }

    /// A copy of the current list state.
    pub async fn snapshot(&self) -> ListState {
        self.state.lock().await.clone()
    }

    /// Fetch a page from the store and make it current.
    ///
    /// On failure the previous page stays visible and a load error is
    /// reported. Returns whether the load succeeded.
    pub async fn load_page(&self, page: u32) -> bool {
        let mut state = self.state.lock().await;
        state.is_loading = true;
        let ok = self.load_into(&mut state, page).await;
        state.is_loading = false;
        ok
    }

    /// Create a task, then reload page one so the new task is visible at
    /// the top. Returns whether the creation succeeded.
    pub async fn create_task(&self, draft: TaskDraft) -> bool {
        let mut state = self.state.lock().await;

        match self.actions.create_task(draft).await {
            Ok(_) => {
                self.notify_success(messages::CREATE_SUCCESS);
                let _ = self.load_into(&mut state, 1).await;
                true
            }
            Err(e) => {
                tracing::warn!(err = %e, "task creation failed");
                drop(state);
                self.notify_error(messages::CREATE_ERROR, &e);
                false
            }
        }
    }

    /// Flip a task's completion flag, optimistically.
    ///
    /// The visible row is flipped before the store confirms; a failure
    /// restores the rows exactly as they were. The task need not be on
    /// the current page.
    pub async fn toggle_complete(&self, id: TaskId, completed: bool) -> bool {
        let mut state = self.state.lock().await;
        let before = state.tasks.clone();

        if let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) {
            task.completed = completed;
        }

        match self.actions.toggle_complete(id, completed).await {
            Ok(confirmed) => {
                if let Some(task) = state.tasks.iter_mut().find(|t| t.id == confirmed.id) {
                    *task = confirmed;
                }
                drop(state);
                let message = if completed {
                    messages::COMPLETE_SUCCESS
                } else {
                    messages::INCOMPLETE_SUCCESS
                };
                self.notify_success(message);
                true
            }
            Err(e) => {
                tracing::warn!(task = %id, err = %e, "toggle failed, rolling back");
                state.tasks = before;
                drop(state);
                self.notify_error(messages::UPDATE_ERROR, &e);
                false
            }
        }
    }

    /// Apply a partial update, optimistically.
    ///
    /// The patch is applied to the visible row right away and the row is
    /// replaced with the server's confirmed record on success.
    pub async fn update_task(&self, id: TaskId, patch: TaskPatch) -> bool {
        let mut state = self.state.lock().await;
        let before = state.tasks.clone();

        if let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) {
            patch.apply(task);
            task.updated_at = Timestamp::now();
        }

        match self.actions.update_task(id, &patch).await {
            Ok(confirmed) => {
                if let Some(task) = state.tasks.iter_mut().find(|t| t.id == confirmed.id) {
                    *task = confirmed;
                }
                drop(state);
                self.notify_success(messages::UPDATE_SUCCESS);
                true
            }
            Err(e) => {
                tracing::warn!(task = %id, err = %e, "update failed, rolling back");
                state.tasks = before;
                drop(state);
                self.notify_error(messages::UPDATE_ERROR, &e);
                false
            }
        }
    }

    /// Delete a task, optimistically.
    ///
    /// The row is removed and the total decremented before the store
    /// confirms. When the deletion empties a page past the first, the
    /// previous page is loaded so the user is never left on an empty
    /// page.
    pub async fn delete_task(&self, id: TaskId) -> bool {
        let mut state = self.state.lock().await;
        let before_tasks = state.tasks.clone();
        let before_total = state.total_count;

        if let Some(position) = state.tasks.iter().position(|t| t.id == id) {
            state.tasks.remove(position);
        }
        state.total_count = state.total_count.saturating_sub(1);

        match self.actions.delete_task(id).await {
            Ok(()) => {
                if state.tasks.is_empty() && state.current_page > 1 {
                    let previous = state.current_page - 1;
                    let _ = self.load_into(&mut state, previous).await;
                }
                drop(state);
                self.notify_success(messages::DELETE_SUCCESS);
                true
            }
            Err(e) => {
                tracing::warn!(task = %id, err = %e, "delete failed, rolling back");
                state.tasks = before_tasks;
                state.total_count = before_total;
                drop(state);
                self.notify_error(messages::DELETE_ERROR, &e);
                false
            }
        }
    }

    /// Replace the state with a freshly fetched page. Failures leave the
    /// state untouched and report a load error.
    async fn load_into(&self, state: &mut ListState, page: u32) -> bool {
        match self.actions.get_tasks(page).await {
            Ok(fetched) => {
                state.tasks = fetched.tasks;
                state.total_count = fetched.total_count;
                state.current_page = page;
                true
            }
            Err(e) => {
                tracing::warn!(page, err = %e, "failed to load tasks");
                self.notify_error(messages::LOAD_ERROR, &e);
                false
            }
        }
    }

    fn notify_success(&self, message: &str) {
        let _ = self.notice_tx.try_send(Notification::success(message));
    }

    fn notify_error(&self, message: &str, err: &impl std::fmt::Display) {
        let _ = self
            .notice_tx
            .try_send(Notification::error(message, err.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
