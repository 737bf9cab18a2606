/// User model and database operations
///
/// A user is anyone who has contacted the bot. Users are unique by their
/// platform `chat_id` and carry a binary role: ordinary `user` (the default
/// on first contact) or `admin`. The admin role is granted either through
/// the shared-passphrase login flow or by promotion from an existing admin.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('user', 'admin');
///
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     chat_id BIGINT NOT NULL UNIQUE,
///     handle VARCHAR(100),
///     display_name VARCHAR(200) NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     status VARCHAR(100) NOT NULL DEFAULT 'participant',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskrelay_shared::models::user::{User, CreateUser, UserRole};
/// use taskrelay_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     chat_id: 123456789,
///     handle: Some("alice".to_string()),
///     display_name: "Alice".to_string(),
///     role: UserRole::User,
/// }).await?;
///
/// let found = User::find_by_chat_id(&pool, 123456789).await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// Binary access-control role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Ordinary participant (default on first contact)
    User,

    /// Administrator: full access to projects, tasks, review, broadcast
    Admin,
}

impl UserRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    /// Checks whether this role grants admin access
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// User model representing a registered chat participant
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user id (monotonically increasing)
    pub id: i64,

    /// Platform chat id (unique per user)
    pub chat_id: i64,

    /// Platform handle without the leading `@` (not all users have one)
    pub handle: Option<String>,

    /// Display name shown in listings and notifications
    pub display_name: String,

    /// Access-control role
    pub role: UserRole,

    /// Free-text status shown on the profile
    pub status: String,

    /// When the user first contacted the bot
    pub created_at: DateTime<Utc>,

    /// When the user record was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Platform chat id
    pub chat_id: i64,

    /// Platform handle (without `@`)
    pub handle: Option<String>,

    /// Display name
    pub display_name: String,

    /// Initial role (defaults to `user`)
    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::User
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the chat id already exists or the database
    /// operation fails.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        data: CreateUser,
    ) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (chat_id, handle, display_name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, chat_id, handle, display_name, role, status, created_at, updated_at
            "#,
        )
        .bind(data.chat_id)
        .bind(data.handle)
        .bind(data.display_name)
        .bind(data.role)
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    /// Finds a user by internal id
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, chat_id, handle, display_name, role, status, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by platform chat id
    pub async fn find_by_chat_id(pool: &PgPool, chat_id: i64) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, chat_id, handle, display_name, role, status, created_at, updated_at
            FROM users
            WHERE chat_id = $1
            "#,
        )
        .bind(chat_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by handle (without the leading `@`)
    pub async fn find_by_handle(pool: &PgPool, handle: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, chat_id, handle, display_name, role, status, created_at, updated_at
            FROM users
            WHERE handle = $1
            "#,
        )
        .bind(handle)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Registers a user on first contact, or refreshes handle and display
    /// name on a repeat `/start`
    ///
    /// Returns the user and whether the row was newly created.
    pub async fn register(
        pool: &PgPool,
        chat_id: i64,
        handle: Option<&str>,
        display_name: &str,
    ) -> Result<(Self, bool), sqlx::Error> {
        // NOW() is transaction-stable, so created_at == updated_at exactly
        // when this statement inserted the row
        let (user, inserted): (User, bool) = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (chat_id, handle, display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (chat_id) DO UPDATE
            SET handle = EXCLUDED.handle,
                display_name = EXCLUDED.display_name,
                updated_at = NOW()
            RETURNING id, chat_id, handle, display_name, role, status, created_at, updated_at
            "#,
        )
        .bind(chat_id)
        .bind(handle)
        .bind(display_name)
        .fetch_one(pool)
        .await
        .map(|u| {
            let inserted = u.created_at == u.updated_at;
            (u, inserted)
        })?;

        Ok((user, inserted))
    }

    /// Grants the admin role to the user with the given chat id, creating
    /// the user when unknown
    ///
    /// Used by the passphrase login flow, which may be the user's very first
    /// interaction with the bot.
    pub async fn grant_admin_by_chat_id(
        pool: &PgPool,
        chat_id: i64,
        handle: Option<&str>,
        display_name: &str,
    ) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (chat_id, handle, display_name, role)
            VALUES ($1, $2, $3, 'admin')
            ON CONFLICT (chat_id) DO UPDATE
            SET role = 'admin',
                updated_at = NOW()
            RETURNING id, chat_id, handle, display_name, role, status, created_at, updated_at
            "#,
        )
        .bind(chat_id)
        .bind(handle)
        .bind(display_name)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Sets a user's role
    ///
    /// Returns None when the user does not exist. The self-demotion guard
    /// lives in the calling flow, not here.
    pub async fn set_role(
        executor: impl PgExecutor<'_>,
        id: i64,
        role: UserRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, chat_id, handle, display_name, role, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(role)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Updates the display name
    pub async fn set_display_name(
        pool: &PgPool,
        id: i64,
        display_name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET display_name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, chat_id, handle, display_name, role, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(display_name)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates the free-text profile status
    pub async fn set_status(
        pool: &PgPool,
        id: i64,
        status: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, chat_id, handle, display_name, role, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Lists all administrators
    pub async fn list_admins(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, chat_id, handle, display_name, role, status, created_at, updated_at
            FROM users
            WHERE role = 'admin'
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Lists all users
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, chat_id, handle, display_name, role, status, created_at, updated_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_as_str() {
        assert_eq!(UserRole::User.as_str(), "user");
        assert_eq!(UserRole::Admin.as_str(), "admin");
    }

    #[test]
    fn test_user_role_is_admin() {
        assert!(!UserRole::User.is_admin());
        assert!(UserRole::Admin.is_admin());
    }

    #[test]
    fn test_default_role() {
        assert_eq!(default_role(), UserRole::User);
    }
}
