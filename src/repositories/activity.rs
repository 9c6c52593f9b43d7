use deadpool_postgres::Pool;

use crate::{error::Result, models::activity::ActivityType};

/// Appends an entry to a user's activity log.
pub async fn log_activity(
    pool: &Pool,
    user_id: i32,
    action: ActivityType,
    ip_address: Option<&str>,
) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            INSERT INTO activity_logs (user_id, action, ip_address)
            VALUES ($1, $2, $3)
            "#,
            &[&user_id, &action.as_str(), &ip_address],
        )
        .await?;
    tracing::debug!("Activity {} logged for user {}", action.as_str(), user_id);
    Ok(())
}
