//! Folder content and folder creation.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use marknote_core::{Folder, FolderContent, FolderId};

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FolderContentQuery {
    pub folder_id: Option<FolderId>,
}

/// `GET /folders?folder_id=`; absent or zero lists the caller's root.
pub async fn get_folder_content(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<FolderContentQuery>, QueryRejection>,
) -> Result<Json<FolderContent>, ApiError> {
    let Query(query) = query?;
    let content = state
        .containment
        .folder_content(&user, query.folder_id)
        .await?;
    Ok(Json(content))
}

/// `GET /folders/:folder_id`.
pub async fn get_folder_content_by_id(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    folder_id: Result<Path<FolderId>, PathRejection>,
) -> Result<Json<FolderContent>, ApiError> {
    let Path(folder_id) = folder_id?;
    let content = state
        .containment
        .folder_content(&user, Some(folder_id))
        .await?;
    Ok(Json(content))
}

#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    #[serde(default)]
    pub parent_id: Option<FolderId>,
    #[serde(default)]
    pub name: String,
}

/// `POST /folders/new`.
pub async fn create_folder(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<CreateFolderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Folder>), ApiError> {
    let Json(req) = payload?;
    let folder = state
        .containment
        .create_sub_folder(&user, req.parent_id, &req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(folder)))
}
