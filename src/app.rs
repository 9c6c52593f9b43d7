use std::sync::Arc;

use anyhow::Result;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_cookies::CookieManagerLayer;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    handlers::{account, user},
    middleware_layer::gatekeeper::gatekeeper,
    state::AppState,
};

/// Seconds between replenished credential attempts per client address.
const CREDENTIAL_REPLENISH_SECS: u64 = 2;
/// Credential attempts a client may burst before being throttled.
const CREDENTIAL_BURST: u32 = 5;

/// Builds the application router.
///
/// The cookie layer wraps the gatekeeper so renewed or removed session
/// cookies end up on the response.
pub fn build_router(state: AppState) -> Result<Router> {
    let credential_governor = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(CREDENTIAL_REPLENISH_SECS)
            .burst_size(CREDENTIAL_BURST)
            .use_headers()
            .finish()
            .ok_or_else(|| anyhow::anyhow!("invalid rate limit configuration"))?,
    );

    let credential_routes = Router::new()
        .route("/actions/sign-in", post(account::sign_in))
        .route("/actions/sign-up", post(account::sign_up))
        .layer(GovernorLayer::new(credential_governor));

    let account_routes = Router::new()
        .route("/actions/sign-out", post(account::sign_out))
        .route("/actions/update-password", post(account::update_password))
        .route("/actions/update-account", post(account::update_account))
        .route("/actions/delete-account", post(account::delete_account));

    let page_routes = Router::new()
        .route("/", get(user::home))
        .route("/sign-in", get(user::sign_in_page))
        .route("/dashboard", get(user::dashboard))
        .route("/api/user", get(user::current_user));

    let gate = state.gate();

    Ok(Router::new()
        .merge(credential_routes)
        .merge(account_routes)
        .merge(page_routes)
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
        .layer(from_fn_with_state(gate, gatekeeper))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new()))
}
