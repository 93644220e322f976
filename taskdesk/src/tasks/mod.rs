//! Task management on the client side.
//!
//! [`actions`] wraps the store with session-aware operations, [`list`]
//! keeps a paged list in sync with optimistic updates, and [`view`] and
//! [`pagination`] are pure projections over the synced data.

pub mod actions;
pub mod list;
pub mod pagination;
pub mod view;

pub use actions::TaskActions;
pub use list::{ListState, TaskListManager};

use taskdesk_proto::task::ValidationError;

use crate::store::StoreError;

/// Errors surfaced by task operations.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("task not found")]
    NotFound,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("{0}")]
    Rejected(String),

    #[error("An unexpected error occurred")]
    Unexpected,
}

impl From<StoreError> for ActionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unauthorized => Self::Unauthorized,
            StoreError::NotFound => Self::NotFound,
            StoreError::Rejected { reason } => Self::Rejected(reason),
            _ => Self::Unexpected,
        }
    }
}
