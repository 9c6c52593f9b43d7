use std::future::Future;

use chrono::Utc;
use deadpool_postgres::Pool;

use crate::crypto::password::{hash_password, verify_password};
use crate::error::Result;
use crate::models::activity::ActivityType;
use crate::models::user::{Role, User};
use crate::repositories::{activity as activity_repo, user as user_repo};
use crate::services::session::{CookieSource, SessionStore};

/// Resolves the signed-in user from the request cookies.
///
/// A missing, invalid or expired session, or a user that no longer exists,
/// all yield `Ok(None)`. Only storage failures are errors.
pub async fn current_user(
    db: &Pool,
    sessions: &SessionStore,
    cookies: &impl CookieSource,
) -> Result<Option<User>> {
    resolve_user(sessions, cookies, |id| user_repo::find_active_by_id(db, id)).await
}

/// Same as [`current_user`] with the user lookup supplied by the caller.
///
/// `lookup` is only called for a session that verified and has not expired.
pub async fn resolve_user<F, Fut>(
    sessions: &SessionStore,
    cookies: &impl CookieSource,
    lookup: F,
) -> Result<Option<User>>
where
    F: FnOnce(i32) -> Fut,
    Fut: Future<Output = Result<Option<User>>>,
{
    let session = match sessions.get(cookies) {
        Ok(Some(session)) => session,
        Ok(None) => return Ok(None),
        Err(e) => {
            tracing::debug!("Ignoring unusable session: {}", e);
            return Ok(None);
        }
    };

    if session.is_expired_at(Utc::now()) {
        return Ok(None);
    }

    let user = lookup(session.user.id).await?;
    if user.is_none() {
        tracing::debug!("Session refers to missing user {}", session.user.id);
    }
    Ok(user)
}

/// Checks an email/password pair.
///
/// Returns `None` for an unknown email and for a wrong password alike.
pub async fn authenticate_user(db: &Pool, email: &str, password: &str) -> Result<Option<User>> {
    tracing::debug!("🔐 Authenticating user: {}", email);

    let Some(user) = user_repo::find_active_by_email(db, email).await? else {
        return Ok(None);
    };

    if !verify_password(password, &user.password_hash) {
        tracing::info!("Rejected password for user {}", user.id);
        return Ok(None);
    }

    tracing::info!("✅ User authenticated: {}", user.id);
    Ok(Some(user))
}

/// Registers a new account owner.
///
/// Returns `None` when the email is already taken.
pub async fn register_user(db: &Pool, email: &str, password: &str) -> Result<Option<User>> {
    if user_repo::find_active_by_email(db, email).await?.is_some() {
        tracing::info!("Sign-up refused, email already registered");
        return Ok(None);
    }

    let password_hash = hash_password(password)?;
    let user = user_repo::create_user(db, email, &password_hash, Role::Owner).await?;

    tracing::info!("✅ User created with ID: {}", user.id);
    Ok(Some(user))
}

/// Replaces a user's password. The caller has already checked the old one.
pub async fn change_password(db: &Pool, user: &User, new_password: &str) -> Result<()> {
    let new_hash = hash_password(new_password)?;
    user_repo::update_password(db, user.id, &new_hash).await?;
    tracing::info!("✅ Password changed for user: {}", user.id);
    Ok(())
}

/// Records an account event without failing the surrounding action.
pub async fn record(db: &Pool, user_id: i32, action: ActivityType, ip_address: Option<&str>) {
    if let Err(e) = activity_repo::log_activity(db, user_id, action, ip_address).await {
        tracing::warn!("Failed to log {} for user {}: {}", action.as_str(), user_id, e);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use chrono::Duration;
    use tower_cookies::cookie::CookieJar;

    use super::*;
    use crate::crypto::token::TokenCodec;
    use crate::error::AppError;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(TokenCodec::new(
            b"0123456789abcdef0123456789abcdef",
            Duration::hours(24),
        )))
    }

    fn user(id: i32) -> User {
        let now = Utc::now();
        User {
            id,
            name: None,
            email: "owner@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Owner,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn valid_session_for_deleted_user_is_no_user() {
        let store = store();
        let mut jar = CookieJar::new();
        jar.add(store.set(42).unwrap());

        let resolved = resolve_user(&store, &jar, |id| async move {
            assert_eq!(id, 42);
            Ok::<Option<User>, AppError>(None)
        })
        .await
        .unwrap();

        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn valid_session_resolves_the_stored_user() {
        let store = store();
        let mut jar = CookieJar::new();
        jar.add(store.set(7).unwrap());

        let resolved = resolve_user(&store, &jar, |id| async move {
            Ok::<Option<User>, AppError>(Some(user(id)))
        })
        .await
        .unwrap();

        assert_eq!(resolved.map(|u| u.id), Some(7));
    }

    #[tokio::test]
    async fn unusable_session_skips_the_lookup() {
        let store = store();
        let called = AtomicBool::new(false);

        let mut jar = CookieJar::new();
        jar.add(tower_cookies::Cookie::new(
            crate::services::session::SESSION_COOKIE,
            "not-a-token",
        ));

        for cookies in [CookieJar::new(), jar] {
            let resolved = resolve_user(&store, &cookies, |_| async {
                called.store(true, Ordering::SeqCst);
                Ok::<Option<User>, AppError>(None)
            })
            .await
            .unwrap();
            assert!(resolved.is_none());
        }

        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn lookup_failure_propagates() {
        let store = store();
        let mut jar = CookieJar::new();
        jar.add(store.set(3).unwrap());

        let result = resolve_user(&store, &jar, |_| async {
            Err::<Option<User>, AppError>(AppError::Internal("pool closed".to_string()))
        })
        .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
