//! # marknote-db
//!
//! PostgreSQL database layer for marknote.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for users, folders, notes, and session tokens
//! - Mapping from constraint violations to domain errors
//!
//! Ownership is enforced by the schema as well as by the services: folders and
//! notes reference their parent through `(id, user_id)` composite foreign keys,
//! so a row can never point into another user's tree.
//!
//! ## Example
//!
//! ```rust,ignore
//! use marknote_db::{Database, FolderRepository, Parent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/marknote").await?;
//!     db.migrate().await?;
//!
//!     let root = db.folders.root_folder(1).await?;
//!     let work = db.folders.create(1, Parent::Folder(root), "work").await?;
//!     println!("Created folder: {}", work.id);
//!     Ok(())
//! }
//! ```

mod constraint;
pub mod folders;
pub mod notes;
pub mod pool;
pub mod tokens;
pub mod users;

#[cfg(feature = "migrations")]
pub mod test_fixtures;

// Re-export core types
pub use marknote_core::*;

pub use folders::PgFolderRepository;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use tokens::PgTokenRepository;
pub use users::PgUserRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub users: PgUserRepository,
    pub folders: PgFolderRepository,
    pub notes: PgNoteRepository,
    pub tokens: PgTokenRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            folders: PgFolderRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone()),
            tokens: PgTokenRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
