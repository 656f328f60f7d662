use std::sync::Arc;

use episodic_db::Stores;

use crate::config::ServerConfig;
use crate::limiter::RateLimiter;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Store handles, PostgreSQL-backed in production.
    pub stores: Stores,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Per-client rate limiter, owned here and shared with the middleware.
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(stores: Stores, config: ServerConfig) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
        Self {
            stores,
            config: Arc::new(config),
            limiter,
        }
    }

    /// State over fresh in-process stores, for tests and local runs.
    pub fn in_memory(config: ServerConfig) -> Self {
        Self::new(Stores::in_memory(), config)
    }
}
