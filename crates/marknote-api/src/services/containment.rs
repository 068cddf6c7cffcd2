//! Folder and note containment.
//!
//! Every operation is scoped to the calling user. A folder id of `None` or
//! [`UNSET_FOLDER_ID`] means the caller's root folder, which is looked up
//! again on each call rather than cached.

use std::sync::Arc;

use tracing::{debug, info, warn};

use marknote_core::validation::{validate_folder_name, validate_note_title};
use marknote_core::{
    Error, Folder, FolderContent, FolderId, FolderRepository, Note, NoteId, NoteRepository,
    Parent, Result, User, UNSET_FOLDER_ID,
};

/// Enforces per-user ownership over the folder tree and its notes.
#[derive(Clone)]
pub struct ContainmentService {
    folders: Arc<dyn FolderRepository>,
    notes: Arc<dyn NoteRepository>,
}

impl ContainmentService {
    pub fn new(folders: Arc<dyn FolderRepository>, notes: Arc<dyn NoteRepository>) -> Self {
        Self { folders, notes }
    }

    /// Map an optional client-supplied folder id to a concrete one.
    async fn resolve_folder(&self, user: &User, folder_id: Option<FolderId>) -> Result<FolderId> {
        match folder_id {
            Some(id) if id != UNSET_FOLDER_ID => Ok(id),
            _ => {
                let root = self.folders.root_folder(user.id).await?;
                debug!(
                    subsystem = "api",
                    component = "containment",
                    user_id = user.id,
                    folder_id = root,
                    "Unset folder id resolved to root"
                );
                Ok(root)
            }
        }
    }

    async fn ensure_owner(&self, user: &User, folder_id: FolderId) -> Result<()> {
        if self.folders.user_owns_folder(user.id, folder_id).await? {
            return Ok(());
        }
        warn!(
            subsystem = "api",
            component = "containment",
            user_id = user.id,
            folder_id,
            "Ownership check failed"
        );
        Err(Error::Unauthorized(format!(
            "folder {folder_id} is not owned by user {}",
            user.id
        )))
    }

    /// Direct sub-folders and notes of a folder the caller owns.
    pub async fn folder_content(
        &self,
        user: &User,
        folder_id: Option<FolderId>,
    ) -> Result<FolderContent> {
        let folder_id = self.resolve_folder(user, folder_id).await?;
        self.ensure_owner(user, folder_id).await?;

        let (folders, notes) = tokio::try_join!(
            self.folders.sub_folders(user.id, folder_id),
            self.notes.in_folder(user.id, folder_id),
        )?;

        debug!(
            subsystem = "api",
            component = "containment",
            op = "folder_content",
            user_id = user.id,
            folder_id,
            result_count = folders.len() + notes.len(),
            "Listed folder content"
        );
        Ok(FolderContent {
            folder_id,
            notes,
            folders,
        })
    }

    /// Create a folder under `parent_id`, or under the root when unset.
    pub async fn create_sub_folder(
        &self,
        user: &User,
        parent_id: Option<FolderId>,
        name: &str,
    ) -> Result<Folder> {
        validate_folder_name(name)?;
        let parent_id = self.resolve_folder(user, parent_id).await?;
        self.ensure_owner(user, parent_id).await?;

        let folder = self
            .folders
            .create(user.id, Parent::Folder(parent_id), name)
            .await?;

        info!(
            subsystem = "api",
            component = "containment",
            op = "create_folder",
            user_id = user.id,
            folder_id = folder.id,
            "Folder created"
        );
        Ok(folder)
    }

    /// Create a note in `folder_id`, or in the root when unset.
    pub async fn create_note(
        &self,
        user: &User,
        folder_id: Option<FolderId>,
        title: &str,
        body: &str,
    ) -> Result<Note> {
        validate_note_title(title)?;
        let folder_id = self.resolve_folder(user, folder_id).await?;
        self.ensure_owner(user, folder_id).await?;

        let note = self.notes.create(user.id, folder_id, title, body).await?;

        info!(
            subsystem = "api",
            component = "containment",
            op = "create_note",
            user_id = user.id,
            folder_id,
            note_id = note.id,
            "Note created"
        );
        Ok(note)
    }

    /// Fetch a note owned by the caller.
    pub async fn note(&self, user: &User, note_id: NoteId) -> Result<Note> {
        self.notes.fetch(user.id, note_id).await
    }

    /// Replace the body of a note owned by the caller.
    pub async fn update_note(&self, user: &User, note_id: NoteId, body: &str) -> Result<Note> {
        let note = self.notes.update_body(user.id, note_id, body).await?;
        info!(
            subsystem = "api",
            component = "containment",
            op = "update_note",
            user_id = user.id,
            note_id,
            "Note updated"
        );
        Ok(note)
    }
}
