/// Membership model and database operations
///
/// Many-to-many participation link between users and projects. The
/// `role_in_project` is free text shown in listings; it carries no
/// access-control meaning (admin access is global, on the user's role).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE memberships (
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role_in_project VARCHAR(100) NOT NULL DEFAULT 'participant',
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use crate::models::user::User;

/// Membership model representing a user's participation in a project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Project id
    pub project_id: i64,

    /// User id
    pub user_id: i64,

    /// Free-text role shown in listings
    pub role_in_project: String,

    /// When the user joined the project
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    /// Adds a user to a project
    ///
    /// # Errors
    ///
    /// Returns an error if the membership already exists or either side is
    /// missing (constraint violations), or the database operation fails.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        project_id: i64,
        user_id: i64,
        role_in_project: &str,
    ) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (project_id, user_id, role_in_project)
            VALUES ($1, $2, $3)
            RETURNING project_id, user_id, role_in_project, joined_at
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role_in_project)
        .fetch_one(executor)
        .await?;

        Ok(membership)
    }

    /// Checks whether a user is a member of a project
    pub async fn is_member(
        pool: &PgPool,
        project_id: i64,
        user_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM memberships WHERE project_id = $1 AND user_id = $2)",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Lists the user ids of all members of a project
    ///
    /// This is the snapshot source for task target lists ("assign to all").
    pub async fn member_ids(pool: &PgPool, project_id: i64) -> Result<Vec<i64>, sqlx::Error> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT user_id FROM memberships WHERE project_id = $1 ORDER BY joined_at ASC",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Lists the members of a project as user records
    pub async fn list_members(pool: &PgPool, project_id: i64) -> Result<Vec<User>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.chat_id, u.handle, u.display_name, u.role, u.status,
                   u.created_at, u.updated_at
            FROM users u
            JOIN memberships m ON m.user_id = u.id
            WHERE m.project_id = $1
            ORDER BY m.joined_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Counts the members of a project
    pub async fn count_by_project(pool: &PgPool, project_id: i64) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM memberships WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Counts the projects a user participates in
    pub async fn count_by_user(pool: &PgPool, user_id: i64) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM memberships WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}
