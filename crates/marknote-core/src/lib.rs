//! # marknote-core
//!
//! Core types, traits, and credential primitives for the marknote notes
//! backend.
//!
//! This crate holds the domain model (users, folders, notes), the repository
//! traits that storage backends implement, and the pieces of auth that do not
//! touch the network: password hashing and opaque session tokens.
//!
//! ## Structured logging fields
//!
//! Every crate logs with `tracing` using the same field names, so log
//! aggregation can filter across the whole service:
//!
//! | Field         | Meaning                                              |
//! |---------------|------------------------------------------------------|
//! | `subsystem`   | `"api"`, `"db"`, or `"auth"`                         |
//! | `component`   | Unit within a subsystem, e.g. `"pool"`, `"folders"`  |
//! | `op`          | Operation name, e.g. `"create_folder"`               |
//! | `user_id`     | Caller or subject of the operation                   |
//! | `folder_id`   | Folder being read or written                         |
//! | `note_id`     | Note being read or written                           |
//! | `duration_ms` | Wall-clock time of the operation                     |
//! | `result_count`| Number of rows returned                              |
//! | `error`       | Display form of an error                             |
//!
//! ## Log level contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Internal failures that produce a 500 response |
//! | WARN  | Expected rejections: duplicates, ownership denials, bad credentials, rate limiting |
//! | INFO  | Startup and shutdown, registrations, sign-ins |
//! | DEBUG | Ownership decisions, root folder resolution |
//! | TRACE | Per-row detail |
//!
//! Passwords, password hashes, and token plaintexts are never logged.

pub mod defaults;
pub mod error;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod models;
pub mod password;
pub mod tokens;
pub mod traits;
pub mod validation;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
#[cfg(any(test, feature = "memory"))]
pub use memory::MemoryStore;
pub use models::*;
pub use password::{HashParams, PasswordHash};
pub use tokens::{hash_token, IssuedToken, TokenScope};
pub use traits::*;
