use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::*;
use crate::error::Result;

pub mod event_repository;
pub mod member_repository;
pub mod submission_repository;

pub use event_repository::SqliteEventRepository;
pub use member_repository::SqliteMemberRepository;
pub use submission_repository::SqliteSubmissionRepository;

#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Roster sorted by last then first name. Owner and staff rows are
    /// hidden unless `include_staff` is set.
    async fn list(&self, include_staff: bool) -> Result<Vec<Member>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Member>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Member>>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// All events, sorted by type, then date, then name.
    async fn list(&self) -> Result<Vec<Event>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Event>>;
    /// Replace the event's verification code with a fresh random one.
    async fn regenerate_verification_code(&self, id: &str) -> Result<Event>;
}

/// Which slice of the submission stream to read.
#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub member_id: Option<String>,
    pub kind: SubmissionKind,
    /// Only rows created at or after this instant.
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionKind {
    /// Point submissions: everything except attendance records.
    #[default]
    Points,
    /// Attendance records only, sorted by event date.
    Attendance,
    All,
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn list(&self, filter: SubmissionFilter) -> Result<Vec<Submission>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Submission>>;
    /// Insert a batch of new rows in one transaction; all or nothing.
    async fn insert_many(&self, rows: &[Submission]) -> Result<()>;
}
