//! In-memory repository implementations.
//!
//! `MemoryStore` implements every repository trait over a single mutex-guarded
//! state, so each operation is atomic with respect to the others. It enforces
//! the same uniqueness and ownership rules as the PostgreSQL schema and is
//! used by service and HTTP tests that should not need a database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::error::{Error, Result};
use crate::models::*;
use crate::tokens::{hash_token, IssuedToken, TokenScope};
use crate::traits::{FolderRepository, NoteRepository, TokenRepository, UserRepository};

#[derive(Default)]
struct State {
    next_user_id: UserId,
    next_folder_id: FolderId,
    next_note_id: NoteId,
    users: Vec<User>,
    folders: Vec<Folder>,
    notes: Vec<Note>,
    tokens: HashMap<String, IssuedToken>,
}

impl State {
    fn insert_user(&mut self, new_user: NewUser) -> Result<User> {
        if self
            .users
            .iter()
            .any(|u| u.username == new_user.username || u.email == new_user.email)
        {
            return Err(Error::DuplicateIdentity(
                "username or email already registered".to_string(),
            ));
        }

        self.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: self.next_user_id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
        };
        self.users.push(user.clone());
        Ok(user)
    }

    fn owns_folder(&self, owner: UserId, folder_id: FolderId) -> bool {
        self.folders
            .iter()
            .any(|f| f.id == folder_id && f.user_id == owner)
    }

    fn insert_folder(&mut self, owner: UserId, parent: Parent, name: &str) -> Result<Folder> {
        if let Parent::Folder(parent_id) = parent {
            if !self.owns_folder(owner, parent_id) {
                return Err(Error::Unauthorized(format!(
                    "folder {parent_id} does not belong to user {owner}"
                )));
            }
        }

        let clash = self.folders.iter().any(|f| {
            f.user_id == owner && f.parent == parent && (parent.is_root() || f.name == name)
        });
        if clash {
            return Err(Error::DuplicateFolder(name.to_string()));
        }

        self.next_folder_id += 1;
        let now = Utc::now();
        let folder = Folder {
            id: self.next_folder_id,
            user_id: owner,
            parent,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.folders.push(folder.clone());
        Ok(folder)
    }
}

/// Thread-safe in-memory store implementing all repository traits.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_with_root_folder(&self, new_user: NewUser) -> Result<Registration> {
        let mut state = self.lock()?;
        let user = state.insert_user(new_user)?;
        match state.insert_folder(user.id, Parent::Root, ROOT_FOLDER_NAME) {
            Ok(root_folder) => Ok(Registration { user, root_folder }),
            Err(e) => {
                state.users.retain(|u| u.id != user.id);
                Err(e)
            }
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .lock()?
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl FolderRepository for MemoryStore {
    async fn create(&self, owner: UserId, parent: Parent, name: &str) -> Result<Folder> {
        self.lock()?.insert_folder(owner, parent, name)
    }

    async fn root_folder(&self, owner: UserId) -> Result<FolderId> {
        self.lock()?
            .folders
            .iter()
            .find(|f| f.user_id == owner && f.parent.is_root())
            .map(|f| f.id)
            .ok_or_else(|| Error::NotFound(format!("root folder for user {owner}")))
    }

    async fn user_owns_folder(&self, owner: UserId, folder_id: FolderId) -> Result<bool> {
        Ok(self.lock()?.owns_folder(owner, folder_id))
    }

    async fn sub_folders(&self, owner: UserId, folder_id: FolderId) -> Result<Vec<Folder>> {
        let mut folders: Vec<Folder> = self
            .lock()?
            .folders
            .iter()
            .filter(|f| f.user_id == owner && f.parent == Parent::Folder(folder_id))
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(folders)
    }
}

#[async_trait]
impl NoteRepository for MemoryStore {
    async fn create(
        &self,
        owner: UserId,
        folder_id: FolderId,
        title: &str,
        body: &str,
    ) -> Result<Note> {
        let mut state = self.lock()?;
        if !state.owns_folder(owner, folder_id) {
            return Err(Error::Unauthorized(format!(
                "folder {folder_id} does not belong to user {owner}"
            )));
        }
        if state
            .notes
            .iter()
            .any(|n| n.folder_id == folder_id && n.title == title)
        {
            return Err(Error::DuplicateNote(title.to_string()));
        }

        state.next_note_id += 1;
        let now = Utc::now();
        let note = Note {
            id: state.next_note_id,
            user_id: owner,
            folder_id,
            title: title.to_string(),
            note: body.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.notes.push(note.clone());
        Ok(note)
    }

    async fn in_folder(&self, owner: UserId, folder_id: FolderId) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .lock()?
            .notes
            .iter()
            .filter(|n| n.user_id == owner && n.folder_id == folder_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)));
        Ok(notes)
    }

    async fn fetch(&self, owner: UserId, note_id: NoteId) -> Result<Note> {
        self.lock()?
            .notes
            .iter()
            .find(|n| n.id == note_id && n.user_id == owner)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("note {note_id}")))
    }

    async fn update_body(&self, owner: UserId, note_id: NoteId, body: &str) -> Result<Note> {
        let mut state = self.lock()?;
        let note = state
            .notes
            .iter_mut()
            .find(|n| n.id == note_id && n.user_id == owner)
            .ok_or_else(|| Error::NotFound(format!("note {note_id}")))?;
        note.note = body.to_string();
        note.updated_at = note.updated_at.max(Utc::now());
        Ok(note.clone())
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn create(
        &self,
        user_id: UserId,
        ttl: Duration,
        scope: TokenScope,
    ) -> Result<IssuedToken> {
        let token = IssuedToken::generate(user_id, ttl, scope)?;
        self.lock()?.tokens.insert(token.hash.clone(), token.clone());
        Ok(token)
    }

    async fn user_for_token(&self, scope: TokenScope, plaintext: &str) -> Result<Option<User>> {
        let state = self.lock()?;
        let now = Utc::now();
        let user = state
            .tokens
            .get(&hash_token(plaintext))
            .filter(|t| t.scope == scope && !t.is_expired_at(now))
            .and_then(|t| state.users.iter().find(|u| u.id == t.user_id))
            .cloned();
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::PasswordHash;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: PasswordHash::from_phc("$argon2id$stub"),
        }
    }

    async fn registered(store: &MemoryStore, name: &str) -> Registration {
        store.create_with_root_folder(new_user(name)).await.unwrap()
    }

    #[tokio::test]
    async fn test_registration_creates_root_folder() {
        let store = MemoryStore::new();
        let reg = registered(&store, "theo").await;

        assert_eq!(reg.root_folder.user_id, reg.user.id);
        assert_eq!(reg.root_folder.parent, Parent::Root);
        assert_eq!(reg.root_folder.name, ROOT_FOLDER_NAME);
        assert_eq!(
            store.root_folder(reg.user.id).await.unwrap(),
            reg.root_folder.id
        );
    }

    #[tokio::test]
    async fn test_duplicate_identity_is_rejected_without_side_effects() {
        let store = MemoryStore::new();
        registered(&store, "theo").await;

        let mut dup = new_user("other");
        dup.email = "theo@example.com".to_string();
        let err = store.create_with_root_folder(dup).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateIdentity(_)));
        assert!(store.get_by_username("other").await.unwrap().is_none());
        assert_eq!(store.lock().unwrap().folders.len(), 1);
    }

    #[tokio::test]
    async fn test_second_root_is_rejected() {
        let store = MemoryStore::new();
        let reg = registered(&store, "theo").await;
        let err = FolderRepository::create(&store, reg.user.id, Parent::Root, "again")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateFolder(_)));
    }

    #[tokio::test]
    async fn test_sibling_folder_names_are_unique() {
        let store = MemoryStore::new();
        let reg = registered(&store, "theo").await;
        let root = Parent::Folder(reg.root_folder.id);

        FolderRepository::create(&store, reg.user.id, root, "work")
            .await
            .unwrap();
        let err = FolderRepository::create(&store, reg.user.id, root, "work")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateFolder(name) if name == "work"));
    }

    #[tokio::test]
    async fn test_same_folder_name_allowed_for_other_user() {
        let store = MemoryStore::new();
        let a = registered(&store, "a").await;
        let b = registered(&store, "b").await;

        FolderRepository::create(&store, a.user.id, Parent::Folder(a.root_folder.id), "work")
            .await
            .unwrap();
        FolderRepository::create(&store, b.user.id, Parent::Folder(b.root_folder.id), "work")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_folder_under_foreign_parent_is_unauthorized() {
        let store = MemoryStore::new();
        let a = registered(&store, "a").await;
        let b = registered(&store, "b").await;

        let err =
            FolderRepository::create(&store, b.user.id, Parent::Folder(a.root_folder.id), "x")
                .await
                .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_user_owns_folder() {
        let store = MemoryStore::new();
        let a = registered(&store, "a").await;
        let b = registered(&store, "b").await;

        assert!(store
            .user_owns_folder(a.user.id, a.root_folder.id)
            .await
            .unwrap());
        assert!(!store
            .user_owns_folder(b.user.id, a.root_folder.id)
            .await
            .unwrap());
        assert!(!store.user_owns_folder(a.user.id, 9999).await.unwrap());
    }

    #[tokio::test]
    async fn test_sub_folders_sorted_by_name() {
        let store = MemoryStore::new();
        let reg = registered(&store, "theo").await;
        let root = Parent::Folder(reg.root_folder.id);

        for name in ["zeta", "alpha", "mid"] {
            FolderRepository::create(&store, reg.user.id, root, name)
                .await
                .unwrap();
        }
        let names: Vec<String> = store
            .sub_folders(reg.user.id, reg.root_folder.id)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn test_duplicate_note_title() {
        let store = MemoryStore::new();
        let reg = registered(&store, "theo").await;

        NoteRepository::create(&store, reg.user.id, reg.root_folder.id, "t1", "a")
            .await
            .unwrap();
        let err = NoteRepository::create(&store, reg.user.id, reg.root_folder.id, "t1", "b")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateNote(_)));
    }

    #[tokio::test]
    async fn test_note_in_foreign_folder_is_unauthorized() {
        let store = MemoryStore::new();
        let a = registered(&store, "a").await;
        let b = registered(&store, "b").await;

        let err = NoteRepository::create(&store, b.user.id, a.root_folder.id, "t", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_fetch_and_update_are_owner_scoped() {
        let store = MemoryStore::new();
        let a = registered(&store, "a").await;
        let b = registered(&store, "b").await;
        let note = NoteRepository::create(&store, a.user.id, a.root_folder.id, "t", "v1")
            .await
            .unwrap();

        assert!(matches!(
            store.fetch(b.user.id, note.id).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.update_body(b.user.id, note.id, "evil").await,
            Err(Error::NotFound(_))
        ));

        let updated = store.update_body(a.user.id, note.id, "v2").await.unwrap();
        assert_eq!(updated.note, "v2");
        assert_eq!(updated.created_at, note.created_at);
        assert!(updated.updated_at >= note.updated_at);
        assert_eq!(store.fetch(a.user.id, note.id).await.unwrap().note, "v2");
    }

    #[tokio::test]
    async fn test_notes_in_folder_ordered_by_update() {
        let store = MemoryStore::new();
        let reg = registered(&store, "theo").await;
        let folder = reg.root_folder.id;

        let first = NoteRepository::create(&store, reg.user.id, folder, "first", "")
            .await
            .unwrap();
        NoteRepository::create(&store, reg.user.id, folder, "second", "")
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.update_body(reg.user.id, first.id, "bumped").await.unwrap();

        let titles: Vec<String> = store
            .in_folder(reg.user.id, folder)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_token_lifecycle() {
        let store = MemoryStore::new();
        let reg = registered(&store, "theo").await;

        let token = TokenRepository::create(
            &store,
            reg.user.id,
            Duration::hours(24),
            TokenScope::Authentication,
        )
        .await
        .unwrap();

        let user = store
            .user_for_token(TokenScope::Authentication, &token.plaintext)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, reg.user.id);

        assert!(store
            .user_for_token(TokenScope::Authentication, "bogus")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_expired_token_resolves_to_none() {
        let store = MemoryStore::new();
        let reg = registered(&store, "theo").await;

        let token = TokenRepository::create(
            &store,
            reg.user.id,
            Duration::hours(-1),
            TokenScope::Authentication,
        )
        .await
        .unwrap();
        assert!(store
            .user_for_token(TokenScope::Authentication, &token.plaintext)
            .await
            .unwrap()
            .is_none());
    }
}
