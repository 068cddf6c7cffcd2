//! Note repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use marknote_core::{Error, FolderId, Note, NoteId, NoteRepository, Result, UserId};

use crate::constraint::map_violation;

const NOTE_COLUMNS: &str = "id, user_id, folder_id, title, note, created_at, updated_at";

fn note_from_row(r: &PgRow) -> Note {
    Note {
        id: r.get("id"),
        user_id: r.get("user_id"),
        folder_id: r.get("folder_id"),
        title: r.get("title"),
        note: r.get("note"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn create(
        &self,
        owner: UserId,
        folder_id: FolderId,
        title: &str,
        body: &str,
    ) -> Result<Note> {
        let row = sqlx::query(&format!(
            "INSERT INTO notes (user_id, folder_id, title, note)
             VALUES ($1, $2, $3, $4)
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(owner)
        .bind(folder_id)
        .bind(title)
        .bind(body)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_violation(
                e,
                Error::DuplicateNote(title.to_string()),
                Error::Unauthorized(format!(
                    "folder {folder_id} does not belong to user {owner}"
                )),
            )
        })?;

        Ok(note_from_row(&row))
    }

    async fn in_folder(&self, owner: UserId, folder_id: FolderId) -> Result<Vec<Note>> {
        let rows = sqlx::query(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes
             WHERE user_id = $1 AND folder_id = $2
             ORDER BY updated_at, id"
        ))
        .bind(owner)
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(note_from_row).collect())
    }

    async fn fetch(&self, owner: UserId, note_id: NoteId) -> Result<Note> {
        let row = sqlx::query(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE user_id = $1 AND id = $2"
        ))
        .bind(owner)
        .bind(note_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref()
            .map(note_from_row)
            .ok_or_else(|| Error::NotFound(format!("note {note_id}")))
    }

    async fn update_body(&self, owner: UserId, note_id: NoteId, body: &str) -> Result<Note> {
        // GREATEST keeps updated_at monotonic if the database clock steps back.
        let row = sqlx::query(&format!(
            "UPDATE notes
             SET note = $1, updated_at = GREATEST(NOW(), updated_at)
             WHERE user_id = $2 AND id = $3
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(body)
        .bind(owner)
        .bind(note_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref()
            .map(note_from_row)
            .ok_or_else(|| Error::NotFound(format!("note {note_id}")))
    }
}
