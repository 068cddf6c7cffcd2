//! PostgreSQL repository tests.
//!
//! Each test runs in its own schema. Run with a reachable server:
//! `DATABASE_URL=postgres://... cargo test -p marknote-db -- --ignored`

#![cfg(feature = "migrations")]

use chrono::Duration;
use marknote_db::test_fixtures::TestDatabase;
use marknote_db::{
    Error, FolderRepository, HashParams, NewUser, NoteRepository, Parent, PasswordHash,
    TokenRepository, TokenScope, UserRepository, ROOT_FOLDER_NAME,
};

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_register_creates_user_and_root() {
    let test_db = TestDatabase::new().await;
    let reg = test_db.register("theo").await;

    assert_eq!(reg.user.username, "theo");
    assert_eq!(reg.root_folder.parent, Parent::Root);
    assert_eq!(reg.root_folder.name, ROOT_FOLDER_NAME);
    assert_eq!(
        test_db.db.folders.root_folder(reg.user.id).await.unwrap(),
        reg.root_folder.id
    );

    let loaded = test_db
        .db
        .users
        .get_by_username("theo")
        .await
        .unwrap()
        .expect("user should exist");
    assert!(loaded.password_hash.matches("Password").unwrap());

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_duplicate_registration_leaves_no_rows() {
    let test_db = TestDatabase::new().await;
    test_db.register("theo").await;

    let err = test_db
        .db
        .users
        .create_with_root_folder(NewUser {
            username: "theo".to_string(),
            email: "other@example.com".to_string(),
            password_hash: PasswordHash::set("pw", &HashParams::low_cost()).unwrap(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateIdentity(_)));

    let roots: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM folders WHERE parent_id IS NULL")
            .fetch_one(test_db.db.pool())
            .await
            .unwrap();
    assert_eq!(roots, 1);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_duplicate_folder_name() {
    let test_db = TestDatabase::new().await;
    let reg = test_db.register("theo").await;
    let root = Parent::Folder(reg.root_folder.id);

    test_db
        .db
        .folders
        .create(reg.user.id, root, "work")
        .await
        .unwrap();
    let err = test_db
        .db
        .folders
        .create(reg.user.id, root, "work")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateFolder(_)));

    let err = test_db
        .db
        .folders
        .create(reg.user.id, Parent::Root, "second-root")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateFolder(_)));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_foreign_parent_and_folder_are_rejected() {
    let test_db = TestDatabase::new().await;
    let a = test_db.register("a").await;
    let b = test_db.register("b").await;

    assert!(!test_db
        .db
        .folders
        .user_owns_folder(b.user.id, a.root_folder.id)
        .await
        .unwrap());
    assert!(test_db
        .db
        .folders
        .user_owns_folder(a.user.id, a.root_folder.id)
        .await
        .unwrap());

    let err = test_db
        .db
        .folders
        .create(b.user.id, Parent::Folder(a.root_folder.id), "x")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));

    let err = test_db
        .db
        .notes
        .create(b.user.id, a.root_folder.id, "t", "x")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_note_lifecycle() {
    let test_db = TestDatabase::new().await;
    let a = test_db.register("a").await;
    let b = test_db.register("b").await;
    let notes = &test_db.db.notes;

    let note = notes
        .create(a.user.id, a.root_folder.id, "t1", "# hello")
        .await
        .unwrap();
    let err = notes
        .create(a.user.id, a.root_folder.id, "t1", "again")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateNote(_)));

    assert!(matches!(
        notes.fetch(b.user.id, note.id).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        notes.update_body(b.user.id, note.id, "evil").await,
        Err(Error::NotFound(_))
    ));

    let updated = notes.update_body(a.user.id, note.id, "# v2").await.unwrap();
    assert_eq!(updated.note, "# v2");
    assert!(updated.updated_at >= note.updated_at);
    assert_eq!(updated.created_at, note.created_at);

    let listed = notes.in_folder(a.user.id, a.root_folder.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].note, "# v2");

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_tokens() {
    let test_db = TestDatabase::new().await;
    let reg = test_db.register("theo").await;
    let tokens = &test_db.db.tokens;

    let live = tokens
        .create(reg.user.id, Duration::hours(24), TokenScope::Authentication)
        .await
        .unwrap();
    let user = tokens
        .user_for_token(TokenScope::Authentication, &live.plaintext)
        .await
        .unwrap()
        .expect("live token should resolve");
    assert_eq!(user.id, reg.user.id);

    let expired = tokens
        .create(reg.user.id, Duration::hours(-1), TokenScope::Authentication)
        .await
        .unwrap();
    assert!(tokens
        .user_for_token(TokenScope::Authentication, &expired.plaintext)
        .await
        .unwrap()
        .is_none());

    assert_eq!(tokens.purge_expired().await.unwrap(), 1);
    assert!(tokens
        .user_for_token(TokenScope::Authentication, &live.plaintext)
        .await
        .unwrap()
        .is_some());

    test_db.cleanup().await;
}
