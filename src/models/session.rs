use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// The identity a session refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// The ID of the user this session belongs to.
    pub id: i32,
}

/// The minimal payload carried inside a session token.
///
/// `expires` is always derived server side when a session is issued or
/// renewed, never taken from client input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    /// The user this session belongs to.
    pub user: SessionUser,
    /// When the session stops being valid (RFC 3339, millisecond precision).
    pub expires: DateTime<Utc>,
}

impl SessionPayload {
    /// Creates a payload for `user_id` expiring at `expires`.
    pub fn new(user_id: i32, expires: DateTime<Utc>) -> Self {
        Self {
            user: SessionUser { id: user_id },
            expires: expires.trunc_subsecs(3),
        }
    }

    /// Whether the payload's own expiry has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }
}
