//! User identity and session types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum allowed password length in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Minimum allowed display name length in characters.
pub const MIN_NAME_LEN: usize = 2;

/// Unique identifier for a user account, based on UUID v7.
///
/// Assigned by the server at sign-up and immutable afterwards. Every task
/// row carries the id of its owner; all store operations are scoped by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Creates a new time-ordered owner identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates an `OwnerId` from an existing UUID.
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

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque bearer token identifying a signed-in session.
///
/// Generated server-side at sign-up/sign-in; clients store and replay it
/// verbatim, never inspecting the contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wraps a server-issued token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Public profile of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The account's owner id.
    pub id: OwnerId,
    /// Sign-in email address, unique per account.
    pub email: String,
    /// Display name shown in the client.
    pub full_name: String,
    /// Optional avatar image URL.
    pub avatar_url: Option<String>,
}

/// Error returned when sign-up fields fail validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// Email does not look like an address.
    #[error("invalid email address")]
    InvalidEmail,
    /// Password is shorter than the minimum.
    #[error("password too short (min {min} chars)")]
    PasswordTooShort {
        /// Minimum allowed length in characters.
        min: usize,
    },
    /// Display name is shorter than the minimum.
    #[error("name too short (min {min} chars)")]
    NameTooShort {
        /// Minimum allowed length in characters.
        min: usize,
    },
}

/// Validates the fields of a sign-up request.
///
/// # Errors
///
/// Returns the first failing check: email shape, then password length,
/// then name length.
pub fn validate_sign_up(
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<(), CredentialError> {
    if !is_valid_email(email) {
        return Err(CredentialError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CredentialError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    if full_name.chars().count() < MIN_NAME_LEN {
        return Err(CredentialError::NameTooShort { min: MIN_NAME_LEN });
    }
    Ok(())
}

/// Checks that an email has a local part and a dotted domain.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && tld.len() >= 2
}
