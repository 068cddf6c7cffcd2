//! Opaque bearer tokens.
//!
//! The plaintext is handed to the client exactly once. Storage only ever sees
//! the SHA-256 hex digest, so a leaked `tokens` table cannot be replayed.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::models::UserId;

/// Number of random bytes in a token plaintext.
pub const TOKEN_BYTES: usize = 32;

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenScope {
    /// Session token issued at sign-in.
    Authentication,
}

impl TokenScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScope::Authentication => "authentication",
        }
    }
}

/// A freshly generated token: the plaintext plus what gets persisted.
#[derive(Clone)]
pub struct IssuedToken {
    pub plaintext: String,
    pub hash: String,
    pub user_id: UserId,
    pub expiry: DateTime<Utc>,
    pub scope: TokenScope,
}

impl IssuedToken {
    /// Generate a random token for `user_id` that expires after `ttl`.
    ///
    /// Fails with `Error::Config` if the expiry is not representable.
    pub fn generate(user_id: UserId, ttl: Duration, scope: TokenScope) -> Result<Self> {
        let expiry = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| Error::Config(format!("token ttl out of range: {ttl}")))?;

        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let plaintext = URL_SAFE_NO_PAD.encode(bytes);

        Ok(Self {
            hash: hash_token(&plaintext),
            plaintext,
            user_id,
            expiry,
            scope,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry <= now
    }
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("plaintext", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("expiry", &self.expiry)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Hex-encoded SHA-256 of a token plaintext.
pub fn hash_token(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex::encode(hasher.finalize())
}
