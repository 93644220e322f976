//! Account and session registries.
//!
//! Passwords are hashed with Argon2id and stored as PHC strings; the
//! plaintext never leaves the sign-up/sign-in handlers. Session tokens
//! are random UUID v4 strings handed to clients as opaque bearers and
//! kept until sign-out or server shutdown.

use std::collections::HashMap;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use taskdesk_proto::user::{OwnerId, SessionToken, UserProfile};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Error returned by account and session operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Sign-up with an email that already has an account.
    #[error("User already registered")]
    EmailTaken,
    /// Email/password mismatch on sign-in.
    #[error("Invalid login credentials")]
    InvalidCredentials,
    /// The session token is unknown or revoked.
    #[error("User not authenticated")]
    Unauthorized,
    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    Hash(String),
}

#[derive(Debug, Clone)]
struct Account {
    profile: UserProfile,
    password_hash: String,
}

/// In-memory account store plus live session table.
///
/// Accounts are keyed by lowercased email, so sign-in is
/// case-insensitive. Sessions map raw token strings to owner ids.
#[derive(Default)]
pub struct AuthRegistry {
    accounts: RwLock<HashMap<String, Account>>,
    sessions: RwLock<HashMap<String, OwnerId>>,
}

impl AuthRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an account and starts a session for it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailTaken`] if the email already has an
    /// account, or [`AuthError::Hash`] if password hashing fails.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<(SessionToken, UserProfile), AuthError> {
        let key = email.to_lowercase();
        let password_hash = hash_password(password)?;

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&key) {
            return Err(AuthError::EmailTaken);
        }
        let profile = UserProfile {
            id: OwnerId::new(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            avatar_url: None,
        };
        accounts.insert(
            key,
            Account {
                profile: profile.clone(),
                password_hash,
            },
        );
        drop(accounts);

        let token = self.start_session(profile.id).await;
        Ok((token, profile))
    }

    /// Verifies credentials and starts a session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on unknown email or
    /// password mismatch; the two cases are indistinguishable on purpose.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(SessionToken, UserProfile), AuthError> {
        let key = email.to_lowercase();
        let accounts = self.accounts.read().await;
        let Some(account) = accounts.get(&key) else {
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(password, &account.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        let profile = account.profile.clone();
        drop(accounts);

        let token = self.start_session(profile.id).await;
        Ok((token, profile))
    }

    /// Revokes a session. Revoking an already-dead token is a no-op.
    pub async fn sign_out(&self, token: &SessionToken) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(token.as_str());
    }

    /// Resolves a session token to the owner behind it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] for unknown or revoked tokens.
    pub async fn resolve(&self, token: &SessionToken) -> Result<OwnerId, AuthError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(token.as_str())
            .copied()
            .ok_or(AuthError::Unauthorized)
    }

    /// Returns the profile behind a session token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] for unknown or revoked tokens.
    pub async fn profile_of(&self, token: &SessionToken) -> Result<UserProfile, AuthError> {
        let owner = self.resolve(token).await?;
        let accounts = self.accounts.read().await;
        accounts
            .values()
            .find(|account| account.profile.id == owner)
            .map(|account| account.profile.clone())
            .ok_or(AuthError::Unauthorized)
    }

    /// Rewrites the display name on the session's profile.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] for unknown or revoked tokens.
    pub async fn update_profile(
        &self,
        token: &SessionToken,
        full_name: &str,
    ) -> Result<UserProfile, AuthError> {
        let owner = self.resolve(token).await?;
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .values_mut()
            .find(|account| account.profile.id == owner)
            .ok_or(AuthError::Unauthorized)?;
        account.profile.full_name = full_name.to_string();
        Ok(account.profile.clone())
    }

    async fn start_session(&self, owner: OwnerId) -> SessionToken {
        let token = SessionToken::new(Uuid::new_v4().to_string());
        let mut sessions = self.sessions.write().await;
        sessions.insert(token.as_str().to_string(), owner);
        drop(sessions);
        token
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}
