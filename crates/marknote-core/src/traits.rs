//! Core traits for marknote persistence.
//!
//! These traits define the interfaces that concrete stores must satisfy.
//! `marknote-db` implements them on PostgreSQL; the `memory` feature of this
//! crate provides an in-process implementation for tests.

use async_trait::async_trait;
use chrono::Duration;

use crate::error::Result;
use crate::models::*;
use crate::tokens::{IssuedToken, TokenScope};

// =============================================================================
// USER REPOSITORY
// =============================================================================

/// Repository for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user and its root folder atomically. Fails with
    /// `DuplicateIdentity` if the username or email is taken.
    ///
    /// Either both rows exist afterwards or neither does.
    async fn create_with_root_folder(&self, new_user: NewUser) -> Result<Registration>;

    /// Look up a user by username.
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;
}

// =============================================================================
// FOLDER REPOSITORY
// =============================================================================

/// Repository for the per-user folder tree.
#[async_trait]
pub trait FolderRepository: Send + Sync {
    /// Create a folder. Fails with `DuplicateFolder` when a sibling with the
    /// same name exists under the same owner and parent.
    async fn create(&self, owner: UserId, parent: Parent, name: &str) -> Result<Folder>;

    /// Id of the owner's root folder. Fails with `NotFound` if the user has
    /// none.
    async fn root_folder(&self, owner: UserId) -> Result<FolderId>;

    /// Whether `folder_id` exists and belongs to `owner`.
    async fn user_owns_folder(&self, owner: UserId, folder_id: FolderId) -> Result<bool>;

    /// Direct sub-folders of `folder_id` owned by `owner`.
    async fn sub_folders(&self, owner: UserId, folder_id: FolderId) -> Result<Vec<Folder>>;
}

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Repository for notes.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Create a note. Fails with `DuplicateNote` when the folder already holds
    /// a note with the same title.
    async fn create(
        &self,
        owner: UserId,
        folder_id: FolderId,
        title: &str,
        body: &str,
    ) -> Result<Note>;

    /// Notes in `folder_id` owned by `owner`, oldest update first.
    async fn in_folder(&self, owner: UserId, folder_id: FolderId) -> Result<Vec<Note>>;

    /// Fetch a note by owner and id. Fails with `NotFound` if it is missing
    /// or belongs to someone else.
    async fn fetch(&self, owner: UserId, note_id: NoteId) -> Result<Note>;

    /// Replace a note body and refresh `updated_at`. Fails with `NotFound`
    /// if no row owned by `owner` matched.
    async fn update_body(&self, owner: UserId, note_id: NoteId, body: &str) -> Result<Note>;
}

// =============================================================================
// TOKEN REPOSITORY
// =============================================================================

/// Repository for bearer tokens.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Generate and persist a token for `user_id`.
    async fn create(&self, user_id: UserId, ttl: Duration, scope: TokenScope)
        -> Result<IssuedToken>;

    /// Resolve a token plaintext to its live owner.
    ///
    /// Unknown and expired tokens both yield `Ok(None)`.
    async fn user_for_token(&self, scope: TokenScope, plaintext: &str) -> Result<Option<User>>;
}
