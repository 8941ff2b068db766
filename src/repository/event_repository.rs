use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::{
    domain::{generate_verification_code, Event},
    error::{AppError, Result},
    repository::EventRepository,
};

#[derive(FromRow)]
pub(crate) struct EventRow {
    id: String,
    name: String,
    notes: Option<String>,
    location: Option<String>,
    event_type: String,
    has_qr_submission: i32,
    needs_additional_info: i32,
    verification_code: Option<String>,
    date: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub(crate) fn row_to_event(row: EventRow) -> Event {
        Event {
            id: row.id,
            name: row.name,
            notes: row.notes,
            location: row.location,
            event_type: row.event_type,
            has_qr_submission: row.has_qr_submission != 0,
            needs_additional_info: row.needs_additional_info != 0,
            verification_code: row.verification_code.filter(|c| !c.is_empty()),
            date: row.date.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        }
    }
}

const EVENT_COLUMNS: &str = "id, name, notes, location, event_type, has_qr_submission, \
     needs_additional_info, verification_code, date, created_at, updated_at";

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn list(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events ORDER BY event_type, date, name",
            EVENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Self::row_to_event).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE id = ?",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.map(Self::row_to_event))
    }

    async fn regenerate_verification_code(&self, id: &str) -> Result<Event> {
        let code = generate_verification_code();
        let now = Utc::now().naive_utc();

        let updated = sqlx::query("UPDATE events SET verification_code = ?, updated_at = ? WHERE id = ?")
            .bind(&code)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Event not found".to_string()));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated event".to_string()))
    }
}
