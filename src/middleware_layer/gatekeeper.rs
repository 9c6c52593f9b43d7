use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;

use crate::{
    config::RouteConfig,
    services::session::{SessionStore, SESSION_COOKIE},
};

/// Whether a path requires a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Protected,
    Open,
}

/// State shared by every invocation of [`gatekeeper`].
#[derive(Clone)]
pub struct GateState {
    /// Session cookie access.
    pub sessions: SessionStore,
    /// Protected prefix, sign-in path and bypassed prefixes.
    pub routes: Arc<RouteConfig>,
}

impl GateState {
    /// Creates the gatekeeper state.
    pub fn new(sessions: SessionStore, routes: RouteConfig) -> Self {
        Self {
            sessions,
            routes: Arc::new(routes),
        }
    }

    fn is_public(&self, path: &str) -> bool {
        self.routes
            .public_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    fn classify(&self, path: &str) -> RouteClass {
        if path.starts_with(self.routes.protected_prefix.as_str()) {
            RouteClass::Protected
        } else {
            RouteClass::Open
        }
    }

    fn to_sign_in(&self) -> Response {
        Redirect::temporary(&self.routes.sign_in_path).into_response()
    }
}

/// Route protection and sliding session renewal, run before every handler.
///
/// * Protected routes without a session cookie are redirected to sign-in.
/// * A `GET` with a valid session re-issues the cookie with a fresh expiry.
/// * A `GET` with an invalid session drops the cookie; protected routes are
///   then redirected, open ones continue unauthenticated.
/// * Other methods pass through untouched.
pub async fn gatekeeper(
    State(gate): State<GateState>,
    cookies: Cookies,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();

    if gate.is_public(&path) {
        return next.run(request).await;
    }

    let class = gate.classify(&path);
    let token = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string());

    let Some(token) = token else {
        if class == RouteClass::Protected {
            tracing::debug!("No session for protected path {}, redirecting", path);
            return gate.to_sign_in();
        }
        return next.run(request).await;
    };

    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let renewed = gate
        .sessions
        .codec()
        .verify(&token)
        .and_then(|payload| gate.sessions.renew(&payload));

    match renewed {
        Ok(cookie) => {
            tracing::debug!("Session renewed on {}", path);
            cookies.add(cookie);
        }
        Err(e) => {
            tracing::debug!("Dropping invalid session on {}: {}", path, e);
            cookies.remove(gate.sessions.clear());
            if class == RouteClass::Protected {
                return gate.to_sign_in();
            }
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::token::TokenCodec;
    use chrono::Duration;

    fn gate() -> GateState {
        let codec = TokenCodec::new(b"0123456789abcdef0123456789abcdef", Duration::hours(24));
        GateState::new(SessionStore::new(Arc::new(codec)), RouteConfig::default())
    }

    #[test]
    fn dashboard_paths_are_protected() {
        let gate = gate();
        assert_eq!(gate.classify("/dashboard"), RouteClass::Protected);
        assert_eq!(gate.classify("/dashboard/security"), RouteClass::Protected);
        assert_eq!(gate.classify("/pricing"), RouteClass::Open);
        assert_eq!(gate.classify("/"), RouteClass::Open);
    }

    #[test]
    fn assets_and_api_bypass_the_gate() {
        let gate = gate();
        assert!(gate.is_public("/api/user"));
        assert!(gate.is_public("/static/app.css"));
        assert!(gate.is_public("/favicon.ico"));
        assert!(!gate.is_public("/dashboard"));
    }
}
