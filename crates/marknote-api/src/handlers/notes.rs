//! Note creation, retrieval, and body updates.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use marknote_core::{Error, FolderId, Note, NoteId};

use crate::auth::CurrentUser;
use crate::error::{ApiError, NOTE_ACCESS_DENIED};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub folder_id: Option<FolderId>,
}

#[derive(Debug, Deserialize)]
pub struct PatchNoteRequest {
    pub note: String,
}

fn note_id_from(path: Result<Path<NoteId>, PathRejection>) -> Result<NoteId, ApiError> {
    let Path(note_id) = path?;
    if note_id <= 0 {
        return Err(ApiError::BadRequest("note_id is required".to_string()));
    }
    Ok(note_id)
}

/// `POST /notes/new`; an absent or zero `folder_id` targets the root.
pub async fn create_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let Json(req) = payload?;
    let note = state
        .containment
        .create_note(&user, req.folder_id, &req.title, &req.note)
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// `GET /notes/:note_id`. Missing and foreign notes both answer 401.
pub async fn get_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<NoteId>, PathRejection>,
) -> Result<Json<Note>, ApiError> {
    let note_id = note_id_from(path)?;
    match state.containment.note(&user, note_id).await {
        Ok(note) => Ok(Json(note)),
        Err(Error::NotFound(_)) => Err(ApiError::Unauthorized(NOTE_ACCESS_DENIED.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// `PATCH /notes/:note_id` → `{"note": ...}`.
pub async fn patch_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<NoteId>, PathRejection>,
    payload: Result<Json<PatchNoteRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let note_id = note_id_from(path)?;
    let Json(req) = payload?;
    let note = state
        .containment
        .update_note(&user, note_id, &req.note)
        .await?;
    Ok(Json(json!({ "note": note })))
}
