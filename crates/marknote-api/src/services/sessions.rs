//! Session issuance and the auth gate.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use marknote_core::validation::validate_credentials;
use marknote_core::{
    Error, IssuedToken, Result, TokenRepository, TokenScope, User, UserRepository,
};

/// Signs users in and resolves session tokens back to users.
#[derive(Clone)]
pub struct SessionService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
    ttl: Duration,
}

impl SessionService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<dyn TokenRepository>, ttl: Duration) -> Self {
        Self { users, tokens, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Check credentials and issue a session token.
    ///
    /// Returns `Ok(None)` when the username is unknown or the password does
    /// not match; the two are not distinguished.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<Option<IssuedToken>> {
        validate_credentials(username, password)?;

        let Some(user) = self.users.get_by_username(username).await? else {
            warn!(subsystem = "auth", op = "sign_in", "Sign-in for unknown username");
            return Ok(None);
        };

        let hash = user.password_hash.clone();
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || hash.matches(&password))
            .await
            .map_err(|e| Error::Internal(format!("password verification task failed: {e}")))??;
        if !matches {
            warn!(subsystem = "auth", op = "sign_in", user_id = user.id, "Password mismatch");
            return Ok(None);
        }

        let token = self
            .tokens
            .create(user.id, self.ttl, TokenScope::Authentication)
            .await?;
        info!(subsystem = "auth", op = "sign_in", user_id = user.id, "Session issued");
        Ok(Some(token))
    }

    /// Resolve a presented token to its live owner. Unknown and expired
    /// tokens yield `Ok(None)`.
    pub async fn authenticate(&self, token: &str) -> Result<Option<User>> {
        self.tokens
            .user_for_token(TokenScope::Authentication, token)
            .await
    }
}
