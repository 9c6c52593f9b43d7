use std::sync::Arc;

use chrono::{DateTime, Utc};
use tower_cookies::cookie::time::OffsetDateTime;
use tower_cookies::cookie::{CookieJar, SameSite};
use tower_cookies::{Cookie, Cookies};

use crate::crypto::token::{TokenCodec, TokenError};
use crate::models::session::SessionPayload;

/// The name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "session";

/// Read access to the cookies sent with a request.
pub trait CookieSource {
    /// Returns the value of the cookie called `name`, if the client sent one.
    fn cookie_value(&self, name: &str) -> Option<String>;
}

impl CookieSource for Cookies {
    fn cookie_value(&self, name: &str) -> Option<String> {
        self.get(name).map(|cookie| cookie.value().to_string())
    }
}

impl CookieSource for CookieJar {
    fn cookie_value(&self, name: &str) -> Option<String> {
        self.get(name).map(|cookie| cookie.value().to_string())
    }
}

/// Cookie-backed session storage.
///
/// There is no server-side session table: the signed token is the session.
/// Reads take the request cookies explicitly and writes return the cookie to
/// put on the response, so the caller decides where it goes.
#[derive(Clone)]
pub struct SessionStore {
    codec: Arc<TokenCodec>,
}

impl SessionStore {
    /// Creates a store signing with `codec`.
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// The codec used to sign and verify session tokens.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Reads and verifies the session sent with the request.
    ///
    /// Returns `Ok(None)` when there is no session cookie. Verification
    /// failures are returned as-is for the caller to handle.
    pub fn get(&self, cookies: &impl CookieSource) -> Result<Option<SessionPayload>, TokenError> {
        match cookies.cookie_value(SESSION_COOKIE) {
            Some(token) => self.codec.verify(&token).map(Some),
            None => Ok(None),
        }
    }

    /// Issues a fresh session for `user_id`.
    ///
    /// Adding the returned cookie replaces whatever session the client held.
    pub fn set(&self, user_id: i32) -> Result<Cookie<'static>, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issues a session for `user_id` as if it were `now`.
    pub fn issue_at(&self, user_id: i32, now: DateTime<Utc>) -> Result<Cookie<'static>, TokenError> {
        let payload = SessionPayload::new(user_id, now + self.codec.ttl());
        let token = self.codec.sign_at(&payload, now)?;
        tracing::debug!("Issued session for user {}", user_id);
        Ok(session_cookie(token, payload.expires))
    }

    /// Re-signs `payload` for the same user with a new expiry.
    pub fn renew(&self, payload: &SessionPayload) -> Result<Cookie<'static>, TokenError> {
        self.set(payload.user.id)
    }

    /// The cookie that removes the session when passed to `remove`.
    ///
    /// Removing an absent session is a no-op.
    pub fn clear(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, "")).path("/").build()
    }
}

fn session_cookie(token: String, expires: DateTime<Utc>) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .expires(OffsetDateTime::from_unix_timestamp(expires.timestamp()).ok())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(TokenCodec::new(
            b"0123456789abcdef0123456789abcdef",
            Duration::hours(24),
        )))
    }

    #[test]
    fn issued_session_reads_back_and_clears() {
        let store = store();
        let mut jar = CookieJar::new();

        jar.add(store.set(42).unwrap());
        let session = store.get(&jar).unwrap().expect("session present");
        assert_eq!(session.user.id, 42);

        jar.remove(store.clear());
        assert_eq!(store.get(&jar).unwrap(), None);
    }

    #[test]
    fn clearing_twice_matches_clearing_once() {
        let store = store();
        let mut jar = CookieJar::new();
        jar.add(store.set(7).unwrap());

        jar.remove(store.clear());
        let once = store.get(&jar).unwrap();
        jar.remove(store.clear());
        let twice = store.get(&jar).unwrap();

        assert_eq!(once, None);
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_cookie_is_no_session() {
        assert_eq!(store().get(&CookieJar::new()).unwrap(), None);
    }

    #[test]
    fn invalid_cookie_propagates_the_token_error() {
        let mut jar = CookieJar::new();
        jar.add(Cookie::new(SESSION_COOKIE, "garbage"));
        assert_eq!(store().get(&jar), Err(TokenError::MalformedToken));
    }

    #[test]
    fn session_cookie_is_locked_down() {
        let cookie = store().set(1).unwrap();
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert!(cookie.expires_datetime().is_some());
    }

    #[test]
    fn cookie_expiry_mirrors_the_payload() {
        let store = store();
        let mut jar = CookieJar::new();
        let cookie = store.set(5).unwrap();
        let cookie_expiry = cookie.expires_datetime().unwrap().unix_timestamp();
        jar.add(cookie);

        let payload = store.get(&jar).unwrap().unwrap();
        assert_eq!(payload.expires.timestamp(), cookie_expiry);
    }

    #[test]
    fn renew_keeps_the_user_and_extends_expiry() {
        let store = store();
        let mut jar = CookieJar::new();
        jar.add(store.issue_at(9, Utc::now() - Duration::hours(2)).unwrap());
        let before = store.get(&jar).unwrap().unwrap();

        jar.add(store.renew(&before).unwrap());
        let after = store.get(&jar).unwrap().unwrap();

        assert_eq!(after.user.id, 9);
        assert!(after.expires > before.expires);
    }
}
