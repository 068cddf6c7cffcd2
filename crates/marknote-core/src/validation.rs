//! Input validation shared by the services and the HTTP surface.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults::{MAX_FOLDER_NAME_LEN, MAX_NOTE_TITLE_LEN, MAX_USERNAME_LEN};
use crate::error::{Error, Result};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern is a valid regex")
});

fn invalid(msg: &str) -> Error {
    Error::Validation(msg.to_string())
}

/// Validate a registration request.
pub fn validate_registration(username: &str, email: &str, password: &str) -> Result<()> {
    if username.is_empty() {
        return Err(invalid("username is required"));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(Error::Validation(format!(
            "username cannot be greater than {} characters",
            MAX_USERNAME_LEN
        )));
    }
    if email.is_empty() {
        return Err(invalid("email is required"));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(invalid("invalid email format"));
    }
    if password.is_empty() {
        return Err(invalid("password is required"));
    }
    Ok(())
}

/// Validate a sign-in request.
pub fn validate_credentials(username: &str, password: &str) -> Result<()> {
    if username.is_empty() {
        return Err(invalid("username cannot be empty"));
    }
    if password.is_empty() {
        return Err(invalid("password cannot be empty"));
    }
    Ok(())
}

pub fn validate_folder_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid("name is required"));
    }
    if name.chars().count() > MAX_FOLDER_NAME_LEN {
        return Err(Error::Validation(format!(
            "name cannot be greater than {} characters",
            MAX_FOLDER_NAME_LEN
        )));
    }
    Ok(())
}

pub fn validate_note_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(invalid("title is required"));
    }
    if title.chars().count() > MAX_NOTE_TITLE_LEN {
        return Err(Error::Validation(format!(
            "title cannot be greater than {} characters",
            MAX_NOTE_TITLE_LEN
        )));
    }
    Ok(())
}
