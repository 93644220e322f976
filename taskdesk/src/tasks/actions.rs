//! Session-aware task operations.
//!
//! [`TaskActions`] is the seam between the UI flows and the store: it
//! resolves the owner from the session, validates input locally, and
//! forwards to whatever [`TaskStore`] it was built over.

use std::sync::Arc;

use taskdesk_proto::task::{TASKS_PER_PAGE, Task, TaskDraft, TaskId, TaskPage, TaskPatch};
use taskdesk_proto::user::OwnerId;

use crate::session::Session;
use crate::store::TaskStore;
use crate::tasks::ActionError;

/// Task operations bound to the signed-in user.
pub struct TaskActions<S> {
    store: Arc<S>,
    session: Arc<Session>,
}

impl<S: TaskStore> TaskActions<S> {
    #[must_use]
    pub fn new(store: Arc<S>, session: Arc<Session>) -> Self {
        Self { store, session }
    }

    /// The owner for all operations. Checked before touching the store,
    /// so a signed-out caller never produces store traffic.
    fn owner(&self) -> Result<OwnerId, ActionError> {
        self.session.owner().ok_or(ActionError::Unauthorized)
    }

    /// Fetch one page of the user's tasks at the standard page size.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Unauthorized`] when signed out, or the
    /// store's failure.
    pub async fn get_tasks(&self, page: u32) -> Result<TaskPage, ActionError> {
        let owner = self.owner()?;
        Ok(self.store.fetch_page(owner, page, TASKS_PER_PAGE).await?)
    }

    /// Normalize, validate and create a task.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Invalid`] for a draft that fails validation
    /// after normalization, [`ActionError::Unauthorized`] when signed
    /// out, or the store's failure.
    pub async fn create_task(&self, draft: TaskDraft) -> Result<Task, ActionError> {
        let owner = self.owner()?;

        let mut draft = draft;
        draft.normalize();
        draft.validate()?;

        Ok(self.store.create(owner, &draft).await?)
    }

    /// Validate and apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Invalid`] for an invalid patch,
    /// [`ActionError::NotFound`] for an unknown task, or
    /// [`ActionError::Unauthorized`] when signed out.
    pub async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Task, ActionError> {
        let owner = self.owner()?;
        patch.validate()?;
        Ok(self.store.update(owner, id, patch).await?)
    }

    /// Flip a task's completion flag.
    ///
    /// # Errors
    ///
    /// Same failures as [`Self::update_task`].
    pub async fn toggle_complete(&self, id: TaskId, completed: bool) -> Result<Task, ActionError> {
        self.update_task(id, &TaskPatch::completion(completed)).await
    }

    /// Delete a task.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::NotFound`] for an unknown task, or
    /// [`ActionError::Unauthorized`] when signed out.
    pub async fn delete_task(&self, id: TaskId) -> Result<(), ActionError> {
        let owner = self.owner()?;
        Ok(self.store.delete(owner, id).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
