use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::{
    domain::{Member, Role},
    error::{AppError, Result},
    repository::MemberRepository,
};

// Database row struct that matches the SQLite schema
#[derive(FromRow)]
pub(crate) struct MemberRow {
    id: String,
    first_name: String,
    last_name: String,
    role: String,
    role_name: String,
    email: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteMemberRepository {
    pool: SqlitePool,
}

impl SqliteMemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub(crate) fn row_to_member(row: MemberRow) -> Result<Member> {
        Ok(Member {
            role: Role::from_str(&row.role)
                .ok_or_else(|| AppError::Database(format!("Invalid member role: {}", row.role)))?,
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            role_name: row.role_name,
            email: row.email.filter(|e| !e.is_empty()),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

const MEMBER_COLUMNS: &str =
    "id, first_name, last_name, role, role_name, email, created_at, updated_at";

#[async_trait]
impl MemberRepository for SqliteMemberRepository {
    async fn list(&self, include_staff: bool) -> Result<Vec<Member>> {
        let query = if include_staff {
            format!(
                "SELECT {} FROM members ORDER BY last_name, first_name",
                MEMBER_COLUMNS
            )
        } else {
            format!(
                "SELECT {} FROM members WHERE role NOT IN ('owner', 'staff') \
                 ORDER BY last_name, first_name",
                MEMBER_COLUMNS
            )
        };

        let rows = sqlx::query_as::<_, MemberRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_member).collect()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Member>> {
        let row = sqlx::query_as::<_, MemberRow>(&format!(
            "SELECT {} FROM members WHERE id = ?",
            MEMBER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_member(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Member>> {
        if email.is_empty() {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, MemberRow>(&format!(
            "SELECT {} FROM members WHERE email = ?",
            MEMBER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_member(r)?)),
            None => Ok(None),
        }
    }
}
