use chrono::{DateTime, Utc};
use serde::Serialize;

/// The two roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Member,
}

impl Role {
    /// The value stored in the `role` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Member => "member",
        }
    }

    /// Parses a stored `role` column value.
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "owner" => Some(Role::Owner),
            "member" => Some(Role::Member),
            _ => None,
        }
    }
}

/// Represents a user in the system.
#[derive(Clone, Debug, Serialize)]
pub struct User {
    /// The unique identifier for the user.
    pub id: i32,
    /// The user's display name.
    pub name: Option<String>,
    /// The user's email address.
    pub email: String,
    /// The user's hashed password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// The user's role.
    pub role: Role,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Set when the account has been soft deleted.
    pub deleted_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_its_column_value() {
        for role in [Role::Owner, Role::Member] {
            assert_eq!(Role::from_db(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_db("admin"), None);
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let now = Utc::now();
        let user = User {
            id: 1,
            name: None,
            email: "a@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Owner,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let json = sonic_rs::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains(r#""role":"owner""#));
    }
}
