//! HTTP handlers, grouped by resource.

pub mod folders;
pub mod health;
pub mod notes;
pub mod tokens;
pub mod users;
