use std::sync::Arc;

use chrono::Duration;
use deadpool_postgres::Pool;

use crate::config::Config;
use crate::crypto::token::TokenCodec;
use crate::error::Result;
use crate::middleware_layer::gatekeeper::GateState;
use crate::services::session::SessionStore;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The application's configuration.
    pub config: Config,
    /// Session cookie issuance and verification.
    pub sessions: SessionStore,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// The signing key is derived here, once, and shared read-only by every
    /// request afterwards.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL pool initialized");

        let codec = TokenCodec::new(
            config.auth_secret.as_slice(),
            Duration::hours(config.session_ttl_hours),
        );
        tracing::info!(
            "✅ Session codec initialized (ttl {}h)",
            config.session_ttl_hours
        );

        Ok(AppState {
            db,
            config: config.clone(),
            sessions: SessionStore::new(Arc::new(codec)),
        })
    }

    /// State for the gatekeeper middleware.
    pub fn gate(&self) -> GateState {
        GateState::new(self.sessions.clone(), self.config.routes.clone())
    }
}
