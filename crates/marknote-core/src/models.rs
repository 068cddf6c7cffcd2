//! Domain models for users, folders, notes, and session tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::password::PasswordHash;

/// Database identifier of a user.
pub type UserId = i64;
/// Database identifier of a folder.
pub type FolderId = i64;
/// Database identifier of a note.
pub type NoteId = i64;

/// Folder id clients send when they mean "my root folder".
pub const UNSET_FOLDER_ID: FolderId = 0;

/// Name given to the folder created at registration.
pub const ROOT_FOLDER_NAME: &str = "root";

// =============================================================================
// USERS
// =============================================================================

/// A registered account.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: PasswordHash,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity fields for a user that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: PasswordHash,
}

// =============================================================================
// FOLDERS
// =============================================================================

/// Where a folder hangs in its owner's tree.
///
/// Serialized as a nullable `parent_id`, `null` meaning root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<FolderId>", into = "Option<FolderId>")]
pub enum Parent {
    /// The owner's root folder: has no parent.
    Root,
    /// A sub-folder of the given folder.
    Folder(FolderId),
}

impl Parent {
    /// The parent folder id, if any.
    pub fn folder_id(self) -> Option<FolderId> {
        match self {
            Parent::Root => None,
            Parent::Folder(id) => Some(id),
        }
    }

    pub fn is_root(self) -> bool {
        matches!(self, Parent::Root)
    }
}

impl From<Option<FolderId>> for Parent {
    fn from(value: Option<FolderId>) -> Self {
        match value {
            Some(id) => Parent::Folder(id),
            None => Parent::Root,
        }
    }
}

impl From<Parent> for Option<FolderId> {
    fn from(value: Parent) -> Self {
        value.folder_id()
    }
}

/// A folder node in a user's tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub user_id: UserId,
    #[serde(rename = "parent_id")]
    pub parent: Parent,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// NOTES
// =============================================================================

/// A Markdown note stored in a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub user_id: UserId,
    pub folder_id: FolderId,
    pub title: String,
    /// Opaque note body.
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Direct children of a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderContent {
    pub folder_id: FolderId,
    /// Ordered by `updated_at`, oldest first.
    pub notes: Vec<Note>,
    pub folders: Vec<Folder>,
}

/// Result of a successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    pub root_folder: Folder,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_folder(parent: Parent) -> Folder {
        let now = Utc::now();
        Folder {
            id: 3,
            user_id: 1,
            parent,
            name: "work".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_parent_from_option() {
        assert_eq!(Parent::from(None), Parent::Root);
        assert_eq!(Parent::from(Some(9)), Parent::Folder(9));
        assert_eq!(Option::<FolderId>::from(Parent::Folder(9)), Some(9));
        assert!(Parent::Root.is_root());
        assert_eq!(Parent::Root.folder_id(), None);
    }

    #[test]
    fn test_root_folder_serializes_null_parent() {
        let json = serde_json::to_value(sample_folder(Parent::Root)).unwrap();
        assert!(json["parent_id"].is_null());
        assert_eq!(json["name"], "work");
    }

    #[test]
    fn test_sub_folder_serializes_parent_id() {
        let json = serde_json::to_value(sample_folder(Parent::Folder(2))).unwrap();
        assert_eq!(json["parent_id"], 2);

        let back: Folder = serde_json::from_value(json).unwrap();
        assert_eq!(back.parent, Parent::Folder(2));
    }

    #[test]
    fn test_user_json_omits_password_hash() {
        let now = Utc::now();
        let user = User {
            id: 1,
            username: "theo".to_string(),
            email: "theo@example.com".to_string(),
            password_hash: PasswordHash::from_phc("$argon2id$stub"),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "theo");
    }
}
