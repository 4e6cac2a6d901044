use std::sync::Arc;

use sqlx::SqlitePool;

use crate::rate_limit::RateLimiter;
use crate::textgen::TextServices;

/// Shared handler state: the database pool plus the injectable services
/// (rate limiter, external text clients) so none of them live in globals.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub limiter: Arc<RateLimiter>,
    pub text: Arc<TextServices>,
}

impl AppState {
    pub fn from_env(pool: SqlitePool) -> Result<Self, anyhow::Error> {
        Ok(Self {
            pool,
            limiter: Arc::new(RateLimiter::from_env()),
            text: Arc::new(TextServices::from_env()?),
        })
    }
}
