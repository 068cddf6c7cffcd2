//! Folder repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::debug;

use marknote_core::{Error, Folder, FolderId, FolderRepository, Parent, Result, UserId};

use crate::constraint::map_violation;

const FOLDER_COLUMNS: &str = "id, user_id, parent_id, name, created_at, updated_at";

fn folder_from_row(r: &PgRow) -> Folder {
    Folder {
        id: r.get("id"),
        user_id: r.get("user_id"),
        parent: Parent::from(r.get::<Option<FolderId>, _>("parent_id")),
        name: r.get("name"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

fn insert_error(err: sqlx::Error, owner: UserId, parent: Parent, name: &str) -> Error {
    map_violation(
        err,
        Error::DuplicateFolder(name.to_string()),
        Error::Unauthorized(format!(
            "parent {:?} does not belong to user {owner}",
            parent.folder_id()
        )),
    )
}

/// PostgreSQL implementation of FolderRepository.
#[derive(Clone)]
pub struct PgFolderRepository {
    pool: Pool<Postgres>,
}

impl PgFolderRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderRepository for PgFolderRepository {
    async fn create(&self, owner: UserId, parent: Parent, name: &str) -> Result<Folder> {
        let row = sqlx::query(&format!(
            "INSERT INTO folders (user_id, parent_id, name)
             VALUES ($1, $2, $3)
             RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(owner)
        .bind(parent.folder_id())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, owner, parent, name))?;

        Ok(folder_from_row(&row))
    }

    async fn root_folder(&self, owner: UserId) -> Result<FolderId> {
        let row = sqlx::query("SELECT id FROM folders WHERE user_id = $1 AND parent_id IS NULL")
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        let id: FolderId = row
            .map(|r| r.get("id"))
            .ok_or_else(|| Error::NotFound(format!("root folder for user {owner}")))?;
        debug!(
            subsystem = "db",
            component = "folders",
            op = "root_folder",
            user_id = owner,
            folder_id = id,
            "Resolved root folder"
        );
        Ok(id)
    }

    async fn user_owns_folder(&self, owner: UserId, folder_id: FolderId) -> Result<bool> {
        let owned: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM folders WHERE id = $1 AND user_id = $2)",
        )
        .bind(folder_id)
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(owned)
    }

    async fn sub_folders(&self, owner: UserId, folder_id: FolderId) -> Result<Vec<Folder>> {
        let rows = sqlx::query(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders
             WHERE user_id = $1 AND parent_id = $2
             ORDER BY name, id"
        ))
        .bind(owner)
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(folder_from_row).collect())
    }
}

/// Transaction-aware variants.
impl PgFolderRepository {
    /// Create a folder within an existing transaction.
    pub async fn create_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: UserId,
        parent: Parent,
        name: &str,
    ) -> Result<Folder> {
        let row = sqlx::query(&format!(
            "INSERT INTO folders (user_id, parent_id, name)
             VALUES ($1, $2, $3)
             RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(owner)
        .bind(parent.folder_id())
        .bind(name)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| insert_error(e, owner, parent, name))?;

        Ok(folder_from_row(&row))
    }
}
