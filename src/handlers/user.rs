use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use tower_cookies::Cookies;

use crate::{
    error::Result,
    models::user::User,
    services::{auth as auth_service, session::SessionStore},
    state::AppState,
};

/// Returns the signed-in user, or `null` when there is none.
pub async fn current_user(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<impl IntoResponse> {
    let user = auth_service::current_user(&state.db, &state.sessions, &cookies).await?;
    Ok(Json(user))
}

/// The protected landing page.
///
/// The gatekeeper only checks the token; an account deleted since the token
/// was issued is sent back to sign-in here.
pub async fn dashboard(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    let user = auth_service::current_user(&state.db, &state.sessions, &cookies).await?;
    Ok(dashboard_page(
        user,
        &state.sessions,
        &cookies,
        &state.config.routes.sign_in_path,
    ))
}

/// Renders the dashboard for `user`, or drops the session and redirects.
pub fn dashboard_page(
    user: Option<User>,
    sessions: &SessionStore,
    cookies: &Cookies,
    sign_in_path: &str,
) -> Response {
    let Some(user) = user else {
        cookies.remove(sessions.clear());
        return Redirect::temporary(sign_in_path).into_response();
    };

    tracing::debug!("Dashboard for user {}", user.id);
    Json(user).into_response()
}

/// Public landing page.
pub async fn home() -> &'static str {
    "saas-starter"
}

/// Sign-in page placeholder; the form posts to `/actions/sign-in`.
pub async fn sign_in_page() -> &'static str {
    "Sign in by posting email and password to /actions/sign-in"
}
