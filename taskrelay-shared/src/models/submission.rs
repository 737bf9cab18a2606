/// Submission model and database operations
///
/// A submission is a user's answer to one task. At most one submission
/// exists per `(user, task)` pair: resubmitting overwrites the row, resets
/// the status to `pending`, and clears any prior feedback and review
/// timestamp. History of earlier attempts is not retained.
///
/// # State Machine
///
/// ```text
/// pending → approved   (terminal for that submission)
///         → rejected   (terminal, but a resubmission reopens it to pending)
/// ```
///
/// Approve and reject are guarded on `status = 'pending'`, so reviewing the
/// same submission twice changes nothing the second time. A resubmission by
/// the user racing with an admin review is last-write-wins; this is accepted
/// behavior, not a bug.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE submission_status AS ENUM ('pending', 'approved', 'rejected');
///
/// CREATE TABLE submissions (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     answer_text TEXT NOT NULL,
///     answer_media VARCHAR(500),
///     status submission_status NOT NULL DEFAULT 'pending',
///     feedback TEXT,
///     submitted_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     reviewed_at TIMESTAMPTZ,
///     clarification TEXT,
///     UNIQUE (user_id, task_id)
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Review status of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "submission_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Awaiting admin review (initial, and after every resubmission)
    Pending,

    /// Approved by an admin
    Approved,

    /// Rejected by an admin; the user may resubmit
    Rejected,
}

impl SubmissionStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    /// Checks whether an admin has already reviewed this submission
    pub fn is_reviewed(&self) -> bool {
        !matches!(self, SubmissionStatus::Pending)
    }

    /// Status icon used in chat listings
    pub fn icon(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "⏳",
            SubmissionStatus::Approved => "✅",
            SubmissionStatus::Rejected => "❌",
        }
    }
}

/// Submission model representing a user's answer to a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Submission {
    /// Unique submission id
    pub id: i64,

    /// Submitting user
    pub user_id: i64,

    /// Task being answered
    pub task_id: i64,

    /// Answer text
    pub answer_text: String,

    /// Optional media reference attached to the answer
    pub answer_media: Option<String>,

    /// Review status
    pub status: SubmissionStatus,

    /// Admin feedback (cleared on resubmission)
    pub feedback: Option<String>,

    /// When the answer was (last) submitted
    pub submitted_at: DateTime<Utc>,

    /// When the answer was reviewed (None while pending)
    pub reviewed_at: Option<DateTime<Utc>>,

    /// Clarification question asked by the user, if any
    pub clarification: Option<String>,
}

impl Submission {
    /// Submits or resubmits an answer
    ///
    /// Upsert-by-overwrite: an existing row for the `(user, task)` pair is
    /// overwritten, its status reset to `pending`, and prior feedback and
    /// review timestamp discarded.
    pub async fn upsert(
        pool: &PgPool,
        user_id: i64,
        task_id: i64,
        answer_text: &str,
        answer_media: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions (user_id, task_id, answer_text, answer_media)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, task_id) DO UPDATE
            SET answer_text = EXCLUDED.answer_text,
                answer_media = EXCLUDED.answer_media,
                status = 'pending',
                feedback = NULL,
                reviewed_at = NULL,
                submitted_at = NOW()
            RETURNING id, user_id, task_id, answer_text, answer_media, status,
                      feedback, submitted_at, reviewed_at, clarification
            "#,
        )
        .bind(user_id)
        .bind(task_id)
        .bind(answer_text)
        .bind(answer_media)
        .fetch_one(pool)
        .await?;

        Ok(submission)
    }

    /// Finds a submission by id
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            SELECT id, user_id, task_id, answer_text, answer_media, status,
                   feedback, submitted_at, reviewed_at, clarification
            FROM submissions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(submission)
    }

    /// Finds a user's submission for a task
    pub async fn find_by_user_task(
        pool: &PgPool,
        user_id: i64,
        task_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            SELECT id, user_id, task_id, answer_text, answer_media, status,
                   feedback, submitted_at, reviewed_at, clarification
            FROM submissions
            WHERE user_id = $1 AND task_id = $2
            "#,
        )
        .bind(user_id)
        .bind(task_id)
        .fetch_optional(pool)
        .await?;

        Ok(submission)
    }

    /// Approves a pending submission, setting the review timestamp
    ///
    /// Returns None when the submission does not exist or is no longer
    /// pending; an already-approved submission stays approved.
    pub async fn approve(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions
            SET status = 'approved',
                reviewed_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id, user_id, task_id, answer_text, answer_media, status,
                      feedback, submitted_at, reviewed_at, clarification
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(submission)
    }

    /// Rejects a pending submission, optionally attaching feedback
    ///
    /// Returns None when the submission does not exist or is no longer
    /// pending.
    pub async fn reject(
        pool: &PgPool,
        id: i64,
        feedback: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions
            SET status = 'rejected',
                feedback = $2,
                reviewed_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id, user_id, task_id, answer_text, answer_media, status,
                      feedback, submitted_at, reviewed_at, clarification
            "#,
        )
        .bind(id)
        .bind(feedback)
        .fetch_optional(pool)
        .await?;

        Ok(submission)
    }

    /// Records the user's clarification question on their submission row,
    /// when one exists
    pub async fn set_clarification(
        pool: &PgPool,
        user_id: i64,
        task_id: i64,
        question: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions
            SET clarification = $3
            WHERE user_id = $1 AND task_id = $2
            RETURNING id, user_id, task_id, answer_text, answer_media, status,
                      feedback, submitted_at, reviewed_at, clarification
            "#,
        )
        .bind(user_id)
        .bind(task_id)
        .bind(question)
        .fetch_optional(pool)
        .await?;

        Ok(submission)
    }

    /// Lists pending submissions for a task, oldest first
    pub async fn list_pending_by_task(
        pool: &PgPool,
        task_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let submissions = sqlx::query_as::<_, Submission>(
            r#"
            SELECT id, user_id, task_id, answer_text, answer_media, status,
                   feedback, submitted_at, reviewed_at, clarification
            FROM submissions
            WHERE task_id = $1 AND status = 'pending'
            ORDER BY submitted_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(submissions)
    }

    /// Lists a user's submissions, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let submissions = sqlx::query_as::<_, Submission>(
            r#"
            SELECT id, user_id, task_id, answer_text, answer_media, status,
                   feedback, submitted_at, reviewed_at, clarification
            FROM submissions
            WHERE user_id = $1
            ORDER BY submitted_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(submissions)
    }

    /// Counts pending submissions for a task
    pub async fn count_pending_by_task(pool: &PgPool, task_id: i64) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM submissions WHERE task_id = $1 AND status = 'pending'",
        )
        .bind(task_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Counts a user's submissions
    pub async fn count_by_user(pool: &PgPool, user_id: i64) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM submissions WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Counts a user's approved submissions
    pub async fn count_approved_by_user(pool: &PgPool, user_id: i64) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM submissions WHERE user_id = $1 AND status = 'approved'",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_status_as_str() {
        assert_eq!(SubmissionStatus::Pending.as_str(), "pending");
        assert_eq!(SubmissionStatus::Approved.as_str(), "approved");
        assert_eq!(SubmissionStatus::Rejected.as_str(), "rejected");
    }

    #[test]
    fn test_submission_status_is_reviewed() {
        assert!(!SubmissionStatus::Pending.is_reviewed());
        assert!(SubmissionStatus::Approved.is_reviewed());
        assert!(SubmissionStatus::Rejected.is_reviewed());
    }

    #[test]
    fn test_submission_status_icons_distinct() {
        assert_ne!(SubmissionStatus::Pending.icon(), SubmissionStatus::Approved.icon());
        assert_ne!(SubmissionStatus::Approved.icon(), SubmissionStatus::Rejected.icon());
    }
}
