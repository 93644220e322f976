//! Store layer abstraction for `TaskDesk`.
//!
//! Defines the [`TaskStore`] trait that all task backends must satisfy.
//! Concrete implementations include:
//! - [`remote::RemoteStore`] — WebSocket connection to the sync server
//! - [`memory::MemoryStore`] — in-process store for testing

pub mod memory;
pub mod remote;

use taskdesk_proto::codec::CodecError;
use taskdesk_proto::task::{Task, TaskDraft, TaskId, TaskPage, TaskPatch};
use taskdesk_proto::user::OwnerId;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The session token is missing, revoked, or unknown to the server.
    #[error("not authenticated")]
    Unauthorized,

    /// The task does not exist under the requesting owner.
    #[error("task not found")]
    NotFound,

    /// Email/password mismatch on sign-in.
    #[error("invalid login credentials")]
    InvalidCredentials,

    /// Sign-up with an email that already has an account.
    #[error("email already registered")]
    EmailTaken,

    /// The server refused the request and said why.
    #[error("{reason}")]
    Rejected {
        /// The server's description of the failure.
        reason: String,
    },

    /// The connection to the server has been closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// The operation timed out before completing.
    #[error("store operation timed out")]
    Timeout,

    /// The server could not be reached at the configured URL.
    #[error("server {0} is unreachable")]
    Unreachable(String),

    /// The server URL is not a usable WebSocket URL.
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),

    /// Encoding a request or decoding a reply failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// An underlying I/O error occurred.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server replied with something other than the expected variant.
    #[error("protocol violation: {0}")]
    Protocol(String),
}

/// Async store trait for owner-scoped task persistence.
///
/// Every operation names the owner whose rows it touches; implementations
/// MUST never return or modify another owner's tasks. Listings are ordered
/// newest first by creation time.
pub trait TaskStore: Send + Sync {
    /// Fetch one page of the owner's tasks (1-based page numbers).
    ///
    /// Pages past the end come back with an empty task list but the real
    /// `total_count`, so callers can tell "no tasks" from "no such page".
    fn fetch_page(
        &self,
        owner: OwnerId,
        page: u32,
        per_page: u32,
    ) -> impl std::future::Future<Output = Result<TaskPage, StoreError>> + Send;

    /// Create a task from a draft and return the stored record.
    ///
    /// The store assigns the id and timestamps; new tasks always start
    /// incomplete.
    fn create(
        &self,
        owner: OwnerId,
        draft: &TaskDraft,
    ) -> impl std::future::Future<Output = Result<Task, StoreError>> + Send;

    /// Apply a partial update and return the record after the patch.
    fn update(
        &self,
        owner: OwnerId,
        id: TaskId,
        patch: &TaskPatch,
    ) -> impl std::future::Future<Output = Result<Task, StoreError>> + Send;

    /// Permanently delete one of the owner's tasks.
    fn delete(
        &self,
        owner: OwnerId,
        id: TaskId,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
