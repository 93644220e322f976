//! Client-side session state.
//!
//! [`Session`] holds the active token and profile in memory and is shared
//! across the store and the flows. [`SessionFile`] persists the session
//! between runs so a signed-in user stays signed in.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use taskdesk_proto::user::{OwnerId, SessionToken, UserProfile};

/// Errors raised while persisting or restoring a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse session file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
struct SessionState {
    token: SessionToken,
    profile: UserProfile,
}

/// Shared authentication state for one client process.
///
/// All accessors take `&self`; interior mutability lets the session be
/// handed around in an `Arc`.
#[derive(Debug, Default)]
pub struct Session {
    state: parking_lot::Mutex<Option<SessionState>>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a token and profile, replacing any previous session.
    pub fn set(&self, token: SessionToken, profile: UserProfile) {
        *self.state.lock() = Some(SessionState { token, profile });
    }

    /// Drop the in-memory session.
    pub fn clear(&self) {
        *self.state.lock() = None;
    }

    /// The active session token, if signed in.
    #[must_use]
    pub fn token(&self) -> Option<SessionToken> {
        self.state.lock().as_ref().map(|s| s.token.clone())
    }

    /// The signed-in user's profile, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.state.lock().as_ref().map(|s| s.profile.clone())
    }

    /// The signed-in user's id, if any.
    #[must_use]
    pub fn owner(&self) -> Option<OwnerId> {
        self.state.lock().as_ref().map(|s| s.profile.id)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Swap in a fresh profile without touching the token.
    ///
    /// Does nothing when signed out; a profile without a token would be
    /// unusable.
    pub fn replace_profile(&self, profile: UserProfile) {
        if let Some(state) = self.state.lock().as_mut() {
            state.profile = profile;
        }
    }
}

/// On-disk representation of a saved session.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    token: String,
    profile: UserProfile,
}

/// A session persisted as JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The platform default location, `<config dir>/taskdesk/session.json`.
    ///
    /// Returns `None` when the platform has no config directory.
    #[must_use]
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join("taskdesk").join("session.json")))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the session to disk, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the directory or file cannot be
    /// written.
    pub fn save(&self, token: &SessionToken, profile: &UserProfile) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SessionError::Io {
                path: self.path.clone(),
                source,
            })?;
        }

        let stored = StoredSession {
            token: token.as_str().to_string(),
            profile: profile.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&self.path, json).map_err(|source| SessionError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Read a saved session, or `None` when no file exists.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] for unreadable files and
    /// [`SessionError::Parse`] for unparseable ones.
    pub fn load(&self) -> Result<Option<(SessionToken, UserProfile)>, SessionError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let stored: StoredSession = serde_json::from_str(&json)?;
        Ok(Some((SessionToken::new(stored.token), stored.profile)))
    }

    /// Remove the saved session. Missing files are fine.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the file exists but cannot be
    /// removed.
    pub fn delete(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
