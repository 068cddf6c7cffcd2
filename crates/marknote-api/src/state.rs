//! Shared application state.

use std::sync::Arc;

use governor::{Quota, RateLimiter};

use marknote_core::{FolderRepository, NoteRepository, TokenRepository, UserRepository};
use marknote_db::Database;

use crate::config::ServerConfig;
use crate::services::{ContainmentService, RegistrationService, SessionService};

/// Global rate limiter type (direct quota, not keyed per client).
pub type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Trait-object handles to the four stores.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub folders: Arc<dyn FolderRepository>,
    pub notes: Arc<dyn NoteRepository>,
    pub tokens: Arc<dyn TokenRepository>,
}

impl Repositories {
    /// PostgreSQL-backed repositories.
    pub fn from_database(db: &Database) -> Self {
        Self {
            users: Arc::new(db.users.clone()),
            folders: Arc::new(db.folders.clone()),
            notes: Arc::new(db.notes.clone()),
            tokens: Arc::new(db.tokens.clone()),
        }
    }

    /// Use one store that implements every repository trait.
    pub fn from_store<S>(store: S) -> Self
    where
        S: UserRepository + FolderRepository + NoteRepository + TokenRepository + Clone + 'static,
    {
        Self {
            users: Arc::new(store.clone()),
            folders: Arc::new(store.clone()),
            notes: Arc::new(store.clone()),
            tokens: Arc::new(store),
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub containment: ContainmentService,
    pub registration: RegistrationService,
    pub sessions: SessionService,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

impl AppState {
    pub fn new(config: ServerConfig, repos: Repositories) -> Self {
        // One cell refills every period/requests, so `requests` fit in `period`.
        let rate_limiter = config.rate_limit.and_then(|limit| {
            Quota::with_period(limit.replenish_interval())
                .map(|quota| Arc::new(RateLimiter::direct(quota.allow_burst(limit.requests))))
        });

        Self {
            containment: ContainmentService::new(repos.folders, repos.notes),
            registration: RegistrationService::new(repos.users.clone(), config.hash_params),
            sessions: SessionService::new(repos.users, repos.tokens, config.token_ttl),
            rate_limiter,
            config: Arc::new(config),
        }
    }
}
