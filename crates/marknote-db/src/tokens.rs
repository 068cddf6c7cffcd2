//! Session token repository implementation.
//!
//! Only the SHA-256 hash of a token is stored; lookups hash the presented
//! plaintext and join to the owning user.

use async_trait::async_trait;
use chrono::Duration;
use sqlx::{Pool, Postgres};
use tracing::debug;

use marknote_core::{
    hash_token, Error, IssuedToken, Result, TokenRepository, TokenScope, User, UserId,
};

use crate::users::user_from_row;

/// PostgreSQL implementation of TokenRepository.
#[derive(Clone)]
pub struct PgTokenRepository {
    pool: Pool<Postgres>,
}

impl PgTokenRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Remove expired tokens. Returns how many were deleted.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tokens WHERE expiry <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "tokens",
            op = "purge_expired",
            removed = result.rows_affected(),
            "Purged expired tokens"
        );
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn create(
        &self,
        user_id: UserId,
        ttl: Duration,
        scope: TokenScope,
    ) -> Result<IssuedToken> {
        let token = IssuedToken::generate(user_id, ttl, scope)?;

        sqlx::query("INSERT INTO tokens (hash, user_id, expiry, scope) VALUES ($1, $2, $3, $4)")
            .bind(&token.hash)
            .bind(token.user_id)
            .bind(token.expiry)
            .bind(token.scope.as_str())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(token)
    }

    async fn user_for_token(&self, scope: TokenScope, plaintext: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT u.id, u.username, u.email, u.password_hash, u.created_at, u.updated_at
             FROM users u
             INNER JOIN tokens t ON t.user_id = u.id
             WHERE t.hash = $1 AND t.scope = $2 AND t.expiry > NOW()",
        )
        .bind(hash_token(plaintext))
        .bind(scope.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(user_from_row))
    }
}
