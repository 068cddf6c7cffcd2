//! User repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::info;

use marknote_core::{
    Error, NewUser, Parent, PasswordHash, Registration, Result, User, UserRepository,
    ROOT_FOLDER_NAME,
};

use crate::constraint::map_violation;
use crate::folders::PgFolderRepository;

pub(crate) const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";

pub(crate) fn user_from_row(r: &PgRow) -> User {
    User {
        id: r.get("id"),
        username: r.get("username"),
        email: r.get("email"),
        password_hash: PasswordHash::from_phc(r.get::<String, _>("password_hash")),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

fn insert_error(err: sqlx::Error, new_user: &NewUser) -> Error {
    map_violation(
        err,
        Error::DuplicateIdentity(format!(
            "username {:?} or email is already registered",
            new_user.username
        )),
        Error::Internal("unexpected foreign key on users".to_string()),
    )
}

/// PostgreSQL implementation of UserRepository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
    folders: PgFolderRepository,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            folders: PgFolderRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_with_root_folder(&self, new_user: NewUser) -> Result<Registration> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let user = self.create_tx(&mut tx, &new_user).await?;
        let root_folder = self
            .folders
            .create_tx(&mut tx, user.id, Parent::Root, ROOT_FOLDER_NAME)
            .await?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "users",
            op = "register",
            user_id = user.id,
            folder_id = root_folder.id,
            "Created user with root folder"
        );
        Ok(Registration { user, root_folder })
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(user_from_row))
    }
}

/// Transaction-aware variants.
impl PgUserRepository {
    /// Insert a user within an existing transaction.
    pub async fn create_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        new_user: &NewUser,
    ) -> Result<User> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (username, email, password_hash)
             VALUES ($1, $2, $3)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(new_user.password_hash.as_str())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| insert_error(e, new_user))?;

        Ok(user_from_row(&row))
    }
}
