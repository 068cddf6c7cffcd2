//! Password hashing using Argon2id.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$m=...`), so the
//! parameters used at registration travel with the hash and verification
//! needs no configuration.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};

use crate::error::{Error, Result};

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    /// Memory in KiB.
    pub memory_kib: u32,
    /// Time iterations.
    pub iterations: u32,
    /// Parallelism degree.
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashParams {
    /// Minimum-cost parameters for tests. Never use for real accounts.
    pub fn low_cost() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }

    fn hasher(&self) -> Result<Argon2<'static>> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| Error::Config(format!("invalid argon2 parameters: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// An Argon2id PHC-format password hash.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash a plaintext password with a fresh random salt.
    pub fn set(plaintext: &str, params: &HashParams) -> Result<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = params
            .hasher()?
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| Error::Internal(format!("hashing password: {e}")))?;
        Ok(Self(hash.to_string()))
    }

    /// Wrap a PHC string loaded from storage.
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    /// The PHC string, for storage.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verify a plaintext password against this hash.
    ///
    /// Returns `Ok(false)` on mismatch and `Err` only if the stored hash is
    /// malformed.
    pub fn matches(&self, plaintext: &str) -> Result<bool> {
        let parsed = argon2::PasswordHash::new(&self.0)
            .map_err(|e| Error::Internal(format!("invalid password hash format: {e}")))?;

        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Internal(format!("verifying password: {e}"))),
        }
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PasswordHash").field(&"[REDACTED]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_matches() {
        let hash = PasswordHash::set("hunter2", &HashParams::low_cost()).unwrap();
        assert!(hash.matches("hunter2").unwrap());
    }

    #[test]
    fn wrong_password_does_not_match() {
        let hash = PasswordHash::set("hunter2", &HashParams::low_cost()).unwrap();
        assert!(!hash.matches("hunter3").unwrap());
    }

    #[test]
    fn hash_is_salted() {
        let a = PasswordHash::set("same", &HashParams::low_cost()).unwrap();
        let b = PasswordHash::set("same", &HashParams::low_cost()).unwrap();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("$argon2id$"));
    }

    #[test]
    fn malformed_hash_returns_error() {
        let hash = PasswordHash::from_phc("not-a-hash");
        assert!(hash.matches("pw").is_err());
    }

    #[test]
    fn debug_redacts_hash() {
        let hash = PasswordHash::set("secret", &HashParams::low_cost()).unwrap();
        let debug = format!("{:?}", hash);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("argon2id"));
    }

    #[test]
    fn invalid_params_are_config_errors() {
        let params = HashParams {
            memory_kib: 0,
            iterations: 0,
            parallelism: 0,
        };
        assert!(matches!(
            PasswordHash::set("pw", &params),
            Err(Error::Config(_))
        ));
    }
}
