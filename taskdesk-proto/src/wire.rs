//! Request/response wire protocol between clients and the task server.
//!
//! Every message is postcard-encoded and carried in a WebSocket binary
//! frame. A connection is a strictly ordered sequence of request/response
//! pairs: the server answers each [`ClientRequest`] with exactly one
//! [`ServerResponse`] before reading the next request, so replies match
//! requests by position and no correlation ids are needed.

use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskDraft, TaskId, TaskPage, TaskPatch};
use crate::user::{SessionToken, UserProfile};

/// Messages sent from a client to the server.
///
/// Task operations carry the session token on every request; the server
/// resolves it to an owner and scopes the operation to that owner's rows.
/// There is no per-connection sign-in state to get out of sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientRequest {
    /// Create an account and start a session.
    ///
    /// Server responds with [`ServerResponse::SessionStarted`] on success.
    SignUp {
        /// Sign-in email, unique per account.
        email: String,
        /// Plaintext password (hashed server-side, never stored).
        password: String,
        /// Display name for the new profile.
        full_name: String,
    },

    /// Start a session for an existing account.
    SignIn {
        /// Sign-in email.
        email: String,
        /// Plaintext password to verify.
        password: String,
    },

    /// End a session; the token is invalid afterwards.
    SignOut {
        /// The session to revoke.
        token: SessionToken,
    },

    /// Fetch the profile behind a session token.
    ///
    /// Used to validate a stored token before reusing it.
    GetUser {
        /// The session to look up.
        token: SessionToken,
    },

    /// Change the display name on the session's profile.
    UpdateProfile {
        /// The session whose profile to update.
        token: SessionToken,
        /// New display name.
        full_name: String,
    },

    /// Fetch one page of the owner's tasks, newest first.
    ListTasks {
        /// The session whose tasks to list.
        token: SessionToken,
        /// 1-based page number.
        page: u32,
        /// Page size (the server clamps unreasonable values).
        per_page: u32,
    },

    /// Create a task owned by the session's user.
    CreateTask {
        /// The session creating the task.
        token: SessionToken,
        /// The task fields; id, owner, and timestamps are server-assigned.
        draft: TaskDraft,
    },

    /// Apply a partial update to one of the owner's tasks.
    UpdateTask {
        /// The session updating the task.
        token: SessionToken,
        /// Which task to update; must belong to the session's user.
        id: TaskId,
        /// The fields to change.
        patch: TaskPatch,
    },

    /// Permanently delete one of the owner's tasks.
    DeleteTask {
        /// The session deleting the task.
        token: SessionToken,
        /// Which task to delete; must belong to the session's user.
        id: TaskId,
    },
}

/// Messages sent from the server back to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerResponse {
    /// A sign-up or sign-in succeeded.
    SessionStarted {
        /// Bearer token for subsequent requests.
        token: SessionToken,
        /// Profile of the signed-in user.
        profile: UserProfile,
    },

    /// A sign-out succeeded.
    SignedOut,

    /// Profile lookup or update succeeded.
    Profile(UserProfile),

    /// One page of tasks.
    TaskPage(TaskPage),

    /// A task was created; the full server-side record.
    TaskCreated(Task),

    /// A task was updated; the full record after the patch.
    TaskUpdated(Task),

    /// A task was deleted.
    TaskDeleted(TaskId),

    /// The request failed.
    Error {
        /// Machine-readable failure category.
        kind: ErrorKind,
        /// Human-readable description.
        reason: String,
    },
}

/// Failure categories reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The session token is missing, revoked, or unknown.
    Unauthorized,
    /// The task does not exist under the requesting owner.
    ///
    /// Deliberately covers both "no such id" and "owned by someone else"
    /// so ids cannot be probed across owners.
    NotFound,
    /// Email/password mismatch on sign-in.
    InvalidCredentials,
    /// Sign-up with an email that already has an account.
    EmailTaken,
    /// The request failed validation or could not be decoded.
    InvalidRequest,
    /// The server failed internally.
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not found",
            Self::InvalidCredentials => "invalid credentials",
            Self::EmailTaken => "email taken",
            Self::InvalidRequest => "invalid request",
            Self::Internal => "internal error",
        };
        write!(f, "{name}")
    }
}
