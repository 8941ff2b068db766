use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Submission, SubmissionStatus, ATTENDANCE_TYPE},
    error::{AppError, Result},
    repository::{SubmissionFilter, SubmissionKind, SubmissionRepository},
};

#[derive(FromRow)]
pub(crate) struct SubmissionRow {
    id: String,
    member_id: String,
    event_id: String,
    submission_type: String,
    status: String,
    description: Option<String>,
    officer_notes: Option<String>,
    upload_link: Option<String>,
    event_date: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteSubmissionRepository {
    pool: SqlitePool,
}

impl SqliteSubmissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub(crate) fn row_to_submission(row: SubmissionRow) -> Result<Submission> {
        Ok(Submission {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            member_id: row.member_id,
            event_id: row.event_id,
            submission_type: row.submission_type,
            status: SubmissionStatus::from_str(&row.status).ok_or_else(|| {
                AppError::Database(format!("Invalid submission status: {}", row.status))
            })?,
            description: row.description,
            officer_notes: row.officer_notes,
            upload_link: row.upload_link.filter(|l| !l.is_empty()),
            event_date: row
                .event_date
                .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

pub(crate) const SUBMISSION_COLUMNS: &str =
    "id, member_id, event_id, submission_type, status, description, officer_notes, \
     upload_link, event_date, created_at, updated_at";

#[async_trait]
impl SubmissionRepository for SqliteSubmissionRepository {
    async fn list(&self, filter: SubmissionFilter) -> Result<Vec<Submission>> {
        let mut query = format!("SELECT {} FROM submissions WHERE 1 = 1", SUBMISSION_COLUMNS);

        match filter.kind {
            SubmissionKind::Points => query.push_str(" AND submission_type != ?"),
            SubmissionKind::Attendance => query.push_str(" AND submission_type = ?"),
            SubmissionKind::All => {}
        }
        if filter.member_id.is_some() {
            query.push_str(" AND member_id = ?");
        }
        if filter.since.is_some() {
            query.push_str(" AND created_at >= ?");
        }
        // Attendance reads sort by when the event happened; point submissions
        // sort by arrival order, which is also the review queue's order.
        match filter.kind {
            SubmissionKind::Attendance => query.push_str(" ORDER BY event_date"),
            _ => query.push_str(" ORDER BY created_at"),
        }

        let mut q = sqlx::query_as::<_, SubmissionRow>(&query);
        if filter.kind != SubmissionKind::All {
            q = q.bind(ATTENDANCE_TYPE);
        }
        if let Some(member_id) = &filter.member_id {
            q = q.bind(member_id);
        }
        if let Some(since) = filter.since {
            q = q.bind(since.naive_utc());
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_submission).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(&format!(
            "SELECT {} FROM submissions WHERE id = ?",
            SUBMISSION_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_submission(r)?)),
            None => Ok(None),
        }
    }

    async fn insert_many(&self, rows: &[Submission]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        for submission in rows {
            sqlx::query(
                r#"
                INSERT INTO submissions (
                    id, member_id, event_id, submission_type, status, description,
                    officer_notes, upload_link, event_date, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(submission.id.to_string())
            .bind(&submission.member_id)
            .bind(&submission.event_id)
            .bind(&submission.submission_type)
            .bind(submission.status.as_str())
            .bind(&submission.description)
            .bind(&submission.officer_notes)
            .bind(submission.upload_link.as_deref().unwrap_or(""))
            .bind(submission.event_date.map(|dt| dt.naive_utc()))
            .bind(submission.created_at.naive_utc())
            .bind(submission.updated_at.naive_utc())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
