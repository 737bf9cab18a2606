/// Project model and database operations
///
/// A project groups users (via memberships) and tasks. Archiving is a
/// one-way, soft-delete style transition: archived projects keep their tasks
/// but are excluded from the creation-flow listings, so no new tasks are
/// created against them. There is no un-archive.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(200) NOT NULL,
///     description TEXT,
///     board_link VARCHAR(500),
///     archived BOOLEAN NOT NULL DEFAULT FALSE,
///     created_by BIGINT REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// Project model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project id (monotonically increasing)
    pub id: i64,

    /// Project name
    pub name: String,

    /// Project description
    pub description: Option<String>,

    /// Optional link to an external board
    pub board_link: Option<String>,

    /// Soft-delete flag (one-way)
    pub archived: bool,

    /// User who created the project (nullable if user deleted)
    pub created_by: Option<i64>,

    /// When the project was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    /// Project name
    pub name: String,

    /// Project description
    pub description: Option<String>,

    /// Optional external board link
    pub board_link: Option<String>,

    /// Creating admin's user id
    pub created_by: Option<i64>,
}

impl Project {
    /// Creates a new project with `archived = false`
    pub async fn create(
        executor: impl PgExecutor<'_>,
        data: CreateProject,
    ) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, board_link, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, board_link, archived, created_by, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.board_link)
        .bind(data.created_by)
        .fetch_one(executor)
        .await?;

        Ok(project)
    }

    /// Finds a project by id
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, board_link, archived, created_by, created_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Lists active (non-archived) projects, oldest first
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, board_link, archived, created_by, created_at
            FROM projects
            WHERE archived = FALSE
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Lists archived projects
    pub async fn list_archived(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, board_link, archived, created_by, created_at
            FROM projects
            WHERE archived = TRUE
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Archives a project (one-way)
    ///
    /// Returns None when the project does not exist or is already archived.
    /// The project's tasks are kept as they are.
    pub async fn archive(
        executor: impl PgExecutor<'_>,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET archived = TRUE
            WHERE id = $1 AND archived = FALSE
            RETURNING id, name, description, board_link, archived, created_by, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(project)
    }

    /// Attaches or replaces the external board link
    pub async fn set_board_link(
        pool: &PgPool,
        id: i64,
        board_link: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET board_link = $2
            WHERE id = $1
            RETURNING id, name, description, board_link, archived, created_by, created_at
            "#,
        )
        .bind(id)
        .bind(board_link)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }
}
