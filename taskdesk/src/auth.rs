//! Authentication flows.
//!
//! [`AuthFlow`] ties the remote store, the in-memory [`Session`] and the
//! optional on-disk [`SessionFile`] together: it validates credentials
//! locally before going to the server, installs the returned session, and
//! keeps the saved session file in step with the in-memory state.

use std::sync::Arc;

use taskdesk_proto::user::{
    CredentialError, MIN_NAME_LEN, SessionToken, UserProfile, validate_sign_up,
};

use crate::session::{Session, SessionFile};
use crate::store::StoreError;
use crate::store::remote::RemoteStore;

/// Errors surfaced by the authentication flows.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("User already registered")]
    EmailTaken,

    #[error(transparent)]
    Invalid(#[from] CredentialError),

    #[error("not signed in")]
    NotSignedIn,

    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Connection(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidCredentials => Self::InvalidCredentials,
            StoreError::EmailTaken => Self::EmailTaken,
            StoreError::Unauthorized => Self::NotSignedIn,
            StoreError::Rejected { reason } => Self::Rejected(reason),
            other => Self::Connection(other.to_string()),
        }
    }
}

/// Sign-up, sign-in, sign-out and session restore.
pub struct AuthFlow {
    store: Arc<RemoteStore>,
    session: Arc<Session>,
    session_file: Option<SessionFile>,
}

impl AuthFlow {
    #[must_use]
    pub fn new(
        store: Arc<RemoteStore>,
        session: Arc<Session>,
        session_file: Option<SessionFile>,
    ) -> Self {
        Self {
            store,
            session,
            session_file,
        }
    }

    /// Register a new account and sign into it.
    ///
    /// Credentials are validated locally first so obviously bad input
    /// never reaches the server.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Invalid`] for malformed credentials,
    /// [`AuthError::EmailTaken`] when the email already has an account,
    /// and [`AuthError::Connection`] for transport failures.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<UserProfile, AuthError> {
        validate_sign_up(email, password, full_name)?;

        let (token, profile) = self.store.sign_up(email, password, full_name).await?;
        self.session.set(token.clone(), profile.clone());
        self.persist(&token, &profile);
        Ok(profile)
    }

    /// Sign into an existing account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when the email or
    /// password is wrong, and [`AuthError::Connection`] for transport
    /// failures.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let (token, profile) = self.store.sign_in(email, password).await?;
        self.session.set(token.clone(), profile.clone());
        self.persist(&token, &profile);
        Ok(profile)
    }

    /// End the current session.
    ///
    /// The local session is cleared and the saved file removed even when
    /// the server call fails; the user asked to be signed out and a dead
    /// connection must not keep them signed in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotSignedIn`] when no session is active, or
    /// the server-side failure after local state has been cleared.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if !self.session.is_authenticated() {
            return Err(AuthError::NotSignedIn);
        }

        let result = self.store.sign_out().await;

        self.session.clear();
        self.forget();

        result?;
        Ok(())
    }

    /// Restore a saved session from disk, verifying it with the server.
    ///
    /// Returns `Ok(None)` when there is nothing usable to restore: no
    /// file, an unreadable file, or a token the server no longer accepts
    /// (the stale file is removed in that case). The profile comes from
    /// the server, not the file, so renames made elsewhere are picked up.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Connection`] when the server cannot be asked;
    /// the saved file is kept so the session can be retried later.
    pub async fn restore(&self) -> Result<Option<UserProfile>, AuthError> {
        let Some(file) = &self.session_file else {
            return Ok(None);
        };

        let stored = match file.load() {
            Ok(Some(stored)) => stored,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::warn!(path = %file.path().display(), err = %e, "ignoring unreadable session file");
                return Ok(None);
            }
        };

        let (token, profile) = stored;
        self.session.set(token, profile);

        match self.store.fetch_profile().await {
            Ok(profile) => {
                self.session.replace_profile(profile.clone());
                Ok(Some(profile))
            }
            Err(StoreError::Unauthorized) => {
                // The saved token has been revoked; drop it.
                self.session.clear();
                self.forget();
                Ok(None)
            }
            Err(e) => {
                self.session.clear();
                Err(e.into())
            }
        }
    }

    /// Change the signed-in user's display name.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Invalid`] for a too-short name,
    /// [`AuthError::NotSignedIn`] without a session, and
    /// [`AuthError::Connection`] for transport failures.
    pub async fn update_profile(&self, full_name: &str) -> Result<UserProfile, AuthError> {
        if full_name.chars().count() < MIN_NAME_LEN {
            return Err(CredentialError::NameTooShort { min: MIN_NAME_LEN }.into());
        }
        let token = self.session.token().ok_or(AuthError::NotSignedIn)?;

        let profile = self.store.update_profile(full_name).await?;
        self.session.replace_profile(profile.clone());
        self.persist(&token, &profile);
        Ok(profile)
    }

    /// Write the session to disk, logging rather than failing: a broken
    /// save costs persistence, not the sign-in itself.
    fn persist(&self, token: &SessionToken, profile: &UserProfile) {
        if let Some(file) = &self.session_file {
            if let Err(e) = file.save(token, profile) {
                tracing::warn!(path = %file.path().display(), err = %e, "failed to save session");
            }
        }
    }

    fn forget(&self) {
        if let Some(file) = &self.session_file {
            if let Err(e) = file.delete() {
                tracing::warn!(path = %file.path().display(), err = %e, "failed to remove session file");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
