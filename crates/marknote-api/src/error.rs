//! HTTP error responses.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

use marknote_core::Error;

/// Message for folder ownership failures. Absent and foreign folders are
/// reported identically.
pub const FOLDER_ACCESS_DENIED: &str = "folder doesn't exist or you don't have access to it";

/// Message for note lookups that matched no row owned by the caller.
pub const NOTE_ACCESS_DENIED: &str = "note doesn't exist or you don't have access to it";

/// Error returned by handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// Detail is logged, never sent to the client.
    Internal(Error),
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    TooManyRequests,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::Unauthorized(detail) => {
                warn!(subsystem = "api", error = %detail, "Folder access denied");
                ApiError::Unauthorized(FOLDER_ACCESS_DENIED.to_string())
            }
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::DuplicateIdentity(_) => {
                ApiError::Conflict("username or email is already registered".to_string())
            }
            Error::DuplicateFolder(name) => {
                ApiError::Conflict(format!("a folder named {name:?} already exists here"))
            }
            Error::DuplicateNote(title) => ApiError::Conflict(format!(
                "a note titled {title:?} already exists in this folder"
            )),
            err @ (Error::Database(_) | Error::Internal(_) | Error::Config(_)) => {
                ApiError::Internal(err)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(err) => {
                error!(subsystem = "api", error = %err, "Request failed");
                "internal server error".to_string()
            }
            ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg) => msg,
            ApiError::TooManyRequests => "Too many requests. Please wait before retrying.".to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
