/// Append-only audit log of admin actions
///
/// Every mutating admin operation (project/task creation, archiving,
/// granting or revoking the admin role) writes one row here, in the same
/// transaction as the mutation it describes.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminAction {
    /// Unique entry id
    pub id: i64,

    /// Acting admin's user id
    pub admin_id: i64,

    /// Action type tag (e.g., "create_project", "add_admin")
    pub action_type: String,

    /// Id of the affected entity, when there is one
    pub target_id: Option<i64>,

    /// Free-text details
    pub details: Option<String>,

    /// When the action happened
    pub created_at: DateTime<Utc>,
}

impl AdminAction {
    /// Records an admin action
    pub async fn record(
        executor: impl PgExecutor<'_>,
        admin_id: i64,
        action_type: &str,
        target_id: Option<i64>,
        details: &str,
    ) -> Result<Self, sqlx::Error> {
        let action = sqlx::query_as::<_, AdminAction>(
            r#"
            INSERT INTO admin_actions (admin_id, action_type, target_id, details)
            VALUES ($1, $2, $3, $4)
            RETURNING id, admin_id, action_type, target_id, details, created_at
            "#,
        )
        .bind(admin_id)
        .bind(action_type)
        .bind(target_id)
        .bind(details)
        .fetch_one(executor)
        .await?;

        Ok(action)
    }

    /// Lists the most recent entries, newest first
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let actions = sqlx::query_as::<_, AdminAction>(
            r#"
            SELECT id, admin_id, action_type, target_id, details, created_at
            FROM admin_actions
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(actions)
    }
}
