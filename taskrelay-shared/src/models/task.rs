/// Task model and database operations
///
/// A task belongs to exactly one project and carries a snapshot of target
/// user ids taken when it was created. Membership changes after creation do
/// not alter existing assignments.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title VARCHAR(300) NOT NULL,
///     description TEXT,
///     image_ref VARCHAR(500),
///     deadline TIMESTAMPTZ,
///     created_by BIGINT REFERENCES users(id) ON DELETE SET NULL,
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     target_user_ids JSONB NOT NULL DEFAULT '[]',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task id (monotonically increasing)
    pub id: i64,

    /// Project this task belongs to
    pub project_id: i64,

    /// Task title
    pub title: String,

    /// Task description
    pub description: Option<String>,

    /// Optional media reference (platform file id or URL)
    pub image_ref: Option<String>,

    /// Optional deadline
    pub deadline: Option<DateTime<Utc>>,

    /// Admin who created the task (nullable if user deleted)
    pub created_by: Option<i64>,

    /// Whether the task is active
    pub active: bool,

    /// Assignment snapshot: user ids targeted at creation time
    pub target_user_ids: Json<Vec<i64>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Project id
    pub project_id: i64,

    /// Task title
    pub title: String,

    /// Task description
    pub description: Option<String>,

    /// Optional media reference
    pub image_ref: Option<String>,

    /// Optional deadline
    pub deadline: Option<DateTime<Utc>>,

    /// Creating admin's user id
    pub created_by: Option<i64>,

    /// Resolved target user ids (snapshot)
    pub target_user_ids: Vec<i64>,
}

impl Task {
    /// Creates a new active task with its target snapshot
    pub async fn create(
        executor: impl PgExecutor<'_>,
        data: CreateTask,
    ) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (project_id, title, description, image_ref, deadline,
                               created_by, target_user_ids)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, project_id, title, description, image_ref, deadline,
                      created_by, active, target_user_ids, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.image_ref)
        .bind(data.deadline)
        .bind(data.created_by)
        .bind(Json(data.target_user_ids))
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    /// Finds a task by id
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, title, description, image_ref, deadline,
                   created_by, active, target_user_ids, created_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists active tasks of a project
    pub async fn list_active_by_project(
        pool: &PgPool,
        project_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, title, description, image_ref, deadline,
                   created_by, active, target_user_ids, created_at
            FROM tasks
            WHERE project_id = $1 AND active = TRUE
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists active tasks in the projects a user is a member of
    ///
    /// This backs the "my tasks" listing.
    pub async fn list_active_for_user(
        pool: &PgPool,
        user_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.project_id, t.title, t.description, t.image_ref, t.deadline,
                   t.created_by, t.active, t.target_user_ids, t.created_at
            FROM tasks t
            JOIN memberships m ON m.project_id = t.project_id
            WHERE m.user_id = $1 AND t.active = TRUE
            ORDER BY t.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks that have at least one pending submission
    ///
    /// Backs the admin review queue.
    pub async fn list_with_pending_submissions(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT DISTINCT t.id, t.project_id, t.title, t.description, t.image_ref,
                   t.deadline, t.created_by, t.active, t.target_user_ids, t.created_at
            FROM tasks t
            JOIN submissions s ON s.task_id = t.id AND s.status = 'pending'
            ORDER BY t.id ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Counts active tasks of a project
    pub async fn count_active_by_project(
        pool: &PgPool,
        project_id: i64,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks WHERE project_id = $1 AND active = TRUE",
        )
        .bind(project_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Deactivates a task
    ///
    /// Returns None when the task does not exist or is already inactive.
    pub async fn deactivate(
        executor: impl PgExecutor<'_>,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET active = FALSE
            WHERE id = $1 AND active = TRUE
            RETURNING id, project_id, title, description, image_ref, deadline,
                      created_by, active, target_user_ids, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// The assignment snapshot as a slice
    pub fn targets(&self) -> &[i64] {
        &self.target_user_ids.0
    }
}
