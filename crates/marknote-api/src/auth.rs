//! Auth gate: resolves the session cookie or bearer token on each restricted
//! request.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use chrono::Duration;
use tracing::debug;

use marknote_core::defaults::AUTH_COOKIE_NAME;
use marknote_core::User;

use crate::error::ApiError;
use crate::state::AppState;

/// Extractor for the authenticated caller.
///
/// Accepts the `auth_token` cookie or an `Authorization: Bearer` header, in
/// that order. Missing, unknown, and expired tokens are all rejected with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))?;

        match state.sessions.authenticate(token).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                debug!(subsystem = "auth", "Rejected unknown or expired token");
                Err(ApiError::Unauthorized("invalid or expired token".to_string()))
            }
        }
    }
}

/// The session token presented with a request, if any.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    cookie_value(headers, AUTH_COOKIE_NAME).or_else(|| bearer_token(headers))
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// `Set-Cookie` value carrying a freshly issued session token.
pub fn session_cookie(token: &str, ttl: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{AUTH_COOKIE_NAME}={token}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        ttl.num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
