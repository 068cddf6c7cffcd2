//! # marknote-api
//!
//! HTTP surface for marknote: configuration, the auth gate, the registration
//! and containment services, handlers, and the router. The `marknote-api`
//! binary wires these to PostgreSQL; tests drive the same router over the
//! in-memory store.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::build_router;
pub use state::{AppState, Repositories};
