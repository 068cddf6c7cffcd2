//! Account registration.

use std::sync::Arc;

use tracing::info;

use marknote_core::validation::validate_registration;
use marknote_core::{Error, HashParams, NewUser, PasswordHash, Registration, Result, UserRepository};

/// Creates a user together with its root folder.
#[derive(Clone)]
pub struct RegistrationService {
    users: Arc<dyn UserRepository>,
    hash_params: HashParams,
}

impl RegistrationService {
    pub fn new(users: Arc<dyn UserRepository>, hash_params: HashParams) -> Self {
        Self { users, hash_params }
    }

    /// Validate input, hash the password, and persist the user and its root
    /// folder in one transaction.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<Registration> {
        validate_registration(username, email, password)?;

        let params = self.hash_params;
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || PasswordHash::set(&password, &params))
            .await
            .map_err(|e| Error::Internal(format!("password hashing task failed: {e}")))??;

        let registration = self
            .users
            .create_with_root_folder(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        info!(
            subsystem = "api",
            component = "registration",
            op = "register",
            user_id = registration.user.id,
            folder_id = registration.root_folder.id,
            "User registered"
        );
        Ok(registration)
    }
}
