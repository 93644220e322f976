//! User-facing notifications.
//!
//! Flows emit a [`Notification`] for every outcome the user should see.
//! The fixed phrasings live in [`messages`] so the wording stays
//! consistent across surfaces and tests.

/// A toast-style message describing the outcome of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success {
        message: String,
        description: Option<String>,
    },
    Error {
        message: String,
        description: Option<String>,
    },
}

impl Notification {
    /// A success notice with no extra detail.
    #[must_use]
    pub fn success(message: &str) -> Self {
        Self::Success {
            message: message.to_string(),
            description: None,
        }
    }

    /// An error notice carrying the underlying failure as its description.
    #[must_use]
    pub fn error(message: &str, description: impl Into<String>) -> Self {
        Self::Error {
            message: message.to_string(),
            description: Some(description.into()),
        }
    }

    /// The headline text.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } | Self::Error { message, .. } => message,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// The fixed notification wordings.
pub mod messages {
    pub const SIGN_IN_SUCCESS: &str = "Successfully signed in!";
    pub const SIGN_UP_SUCCESS: &str = "Successfully signed up!";
    pub const SIGN_IN_ERROR: &str = "An error occurred during sign in";
    pub const SIGN_UP_ERROR: &str = "An error occurred during sign up";

    pub const PROFILE_UPDATE_SUCCESS: &str = "Profile updated successfully!";
    pub const PROFILE_UPDATE_ERROR: &str = "Failed to update profile";

    pub const CREATE_SUCCESS: &str = "Task created successfully!";
    pub const CREATE_ERROR: &str = "Failed to create task";
    pub const UPDATE_SUCCESS: &str = "Task updated successfully!";
    pub const UPDATE_ERROR: &str = "Failed to update task";
    pub const DELETE_SUCCESS: &str = "Task deleted successfully!";
    pub const DELETE_ERROR: &str = "Failed to delete task";
    pub const COMPLETE_SUCCESS: &str = "Task marked as completed!";
    pub const INCOMPLETE_SUCCESS: &str = "Task marked as incomplete!";
    pub const LOAD_ERROR: &str = "Failed to load tasks";
}
