use deadpool_postgres::Pool;
use tokio_postgres::Row;
use crate::{
    error::{AppError, Result},
    models::user::{Role, User},
};

/// A helper function to map a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> Result<User> {
    let role: String = row.try_get("role").map_err(|_| AppError::MissingData("role".to_string()))?;
    Ok(User {
        id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
        name: row.try_get("name").map_err(|_| AppError::MissingData("name".to_string()))?,
        email: row.try_get("email").map_err(|_| AppError::MissingData("email".to_string()))?,
        password_hash: row.try_get("password_hash").map_err(|_| AppError::MissingData("password_hash".to_string()))?,
        role: Role::from_db(&role).ok_or_else(|| AppError::MissingData(format!("role '{}'", role)))?,
        created_at: row.try_get("created_at").map_err(|_| AppError::MissingData("created_at".to_string()))?,
        updated_at: row.try_get("updated_at").map_err(|_| AppError::MissingData("updated_at".to_string()))?,
        deleted_at: row.try_get("deleted_at").map_err(|_| AppError::MissingData("deleted_at".to_string()))?,
    })
}

/// Creates a new user in the database.
pub async fn create_user(
    pool: &Pool,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<User> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
            &[&email, &password_hash, &role.as_str()],
        )
        .await?;
    row_to_user(&row)
}

/// Finds a live (not soft deleted) user by their email address.
pub async fn find_active_by_email(pool: &Pool, email: &str) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT *
            FROM users
            WHERE email = $1 AND deleted_at IS NULL
            LIMIT 1
            "#,
            &[&email],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Finds a live (not soft deleted) user by their ID.
pub async fn find_active_by_id(pool: &Pool, user_id: i32) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT *
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            LIMIT 1
            "#,
            &[&user_id],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Updates a user's password hash.
pub async fn update_password(pool: &Pool, user_id: i32, password_hash: &str) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            UPDATE users
            SET password_hash = $1, updated_at = NOW()
            WHERE id = $2
            "#,
            &[&password_hash, &user_id],
        )
        .await?;
    Ok(())
}

/// Updates a user's name and email.
pub async fn update_account(pool: &Pool, user_id: i32, name: &str, email: &str) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            UPDATE users
            SET name = $1, email = $2, updated_at = NOW()
            WHERE id = $3
            "#,
            &[&name, &email, &user_id],
        )
        .await?;
    Ok(())
}

/// Soft deletes a user.
///
/// The email is suffixed so the address can be registered again.
pub async fn soft_delete(pool: &Pool, user_id: i32) -> Result<()> {
    let client = pool.get().await?;
    let updated = client
        .execute(
            r#"
            UPDATE users
            SET deleted_at = NOW(),
                email = CONCAT(email, '-', id, '-deleted')
            WHERE id = $1 AND deleted_at IS NULL
            "#,
            &[&user_id],
        )
        .await?;
    if updated == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
