//! Task domain types shared between client and server.
//!
//! All types in this module cross the wire serialized with postcard.
//! Validation limits are enforced on both sides: clients validate before
//! sending, the server validates again before touching the store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::OwnerId;

/// Maximum allowed title length in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum allowed description length in characters.
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Fixed page size for task listings (1-based page numbers).
pub const TASKS_PER_PAGE: u32 = 9;

/// Unique identifier for a task, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Task priority, ordered from least to most urgent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal urgency (the default for new tasks).
    #[default]
    Medium,
    /// Needs attention first.
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        write!(f, "{name}")
    }
}

/// Error returned when parsing an unknown priority name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority {0:?} (expected low, medium, or high)")]
pub struct ParsePriorityError(String);

impl std::str::FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

/// Millisecond-precision UTC timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp for the current instant.
    #[must_use]
    pub fn now() -> Self {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    /// Creates a timestamp from milliseconds since the UNIX epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as milliseconds since the UNIX epoch.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// A task as stored by the server and mirrored by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, assigned by the server at creation.
    pub id: TaskId,
    /// The user who owns this task. Tasks are never visible across owners.
    pub owner: OwnerId,
    /// Short title, non-empty, at most [`MAX_TITLE_LEN`] characters.
    pub title: String,
    /// Optional free-form details, at most [`MAX_DESCRIPTION_LEN`] characters.
    pub description: Option<String>,
    /// Urgency used for display ordering.
    pub priority: Priority,
    /// Optional calendar due date (no time component).
    pub due_date: Option<NaiveDate>,
    /// Whether the task is done. New tasks always start incomplete.
    pub completed: bool,
    /// When the task was created. Immutable; drives the listing order.
    pub created_at: Timestamp,
    /// When the task was last modified. Refreshed by the server on update.
    pub updated_at: Timestamp,
}

/// Payload for creating a task.
///
/// The server assigns id, owner, and timestamps, and forces `completed`
/// to start false, so none of those appear here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Title for the new task.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Priority for the new task.
    pub priority: Priority,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
}

impl TaskDraft {
    /// Creates a draft with the given title and default priority.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: Priority::default(),
            due_date: None,
        }
    }

    /// Coalesces an empty-string description to absent.
    ///
    /// Input surfaces hand optional text fields over as empty strings;
    /// the stored form uses `None` for "no description".
    pub fn normalize(&mut self) {
        if self.description.as_deref() == Some("") {
            self.description = None;
        }
    }

    /// Validates this draft for submission.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the title is empty or too long,
    /// or if the description exceeds [`MAX_DESCRIPTION_LEN`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }
}

/// Partial update for a task. Absent fields are left untouched.
///
/// `description` and `due_date` are doubly optional so a patch can
/// distinguish "leave alone" (`None`), "set" (`Some(Some(..))`), and
/// "clear" (`Some(None)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaskPatch {
    /// New title, if changing.
    pub title: Option<String>,
    /// New description, if changing (`Some(None)` clears it).
    pub description: Option<Option<String>>,
    /// New priority, if changing.
    pub priority: Option<Priority>,
    /// New due date, if changing (`Some(None)` clears it).
    pub due_date: Option<Option<NaiveDate>>,
    /// New completion state, if changing.
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Returns a patch that only flips the completion state.
    #[must_use]
    pub fn completion(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    /// Returns `true` when no field is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.completed.is_none()
    }

    /// Writes the present fields into `task`, leaving the rest untouched.
    ///
    /// Does not touch `updated_at`; callers stamp that themselves.
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            task.description.clone_from(description);
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }

    /// Validates the present fields.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if a present title is empty or too
    /// long, or a present description exceeds [`MAX_DESCRIPTION_LEN`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(Some(description)) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }
}

/// One page of a task listing, ordered newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPage {
    /// The tasks on this page, `created_at` descending.
    pub tasks: Vec<Task>,
    /// Total number of tasks the owner has, across all pages.
    pub total_count: u64,
}

/// Error returned when a draft or patch fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Title is empty.
    #[error("title is required")]
    TitleEmpty,
    /// Title exceeds the maximum allowed length.
    #[error("title too long ({len} chars, max {max})")]
    TitleTooLong {
        /// Actual length of the title in characters.
        len: usize,
        /// Maximum allowed length in characters.
        max: usize,
    },
    /// Description exceeds the maximum allowed length.
    #[error("description too long ({len} chars, max {max})")]
    DescriptionTooLong {
        /// Actual length of the description in characters.
        len: usize,
        /// Maximum allowed length in characters.
        max: usize,
    },
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        return Err(ValidationError::TitleEmpty);
    }
    let len = title.chars().count();
    if len > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong {
            len,
            max: MAX_TITLE_LEN,
        });
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ValidationError> {
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::DescriptionTooLong {
            len,
            max: MAX_DESCRIPTION_LEN,
        });
    }
    Ok(())
}
