use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Submission {
    pub id: Uuid,
    pub member_id: String,
    /// Event slug, or `POINT_BOOST_EVENT_ID` for synthetic bonus points.
    pub event_id: String,
    pub submission_type: String,
    pub status: SubmissionStatus,
    pub description: Option<String>,
    pub officer_notes: Option<String>,
    /// Opaque object-store key for the evidence image, if any.
    pub upload_link: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
#[serde(rename_all = "kebab-case")]
pub enum SubmissionStatus {
    Pending,
    AutoApproved,
    Approved,
    Rejected,
    Cancelled,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::AutoApproved => "auto-approved",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SubmissionStatus::Pending),
            "auto-approved" => Some(SubmissionStatus::AutoApproved),
            "approved" => Some(SubmissionStatus::Approved),
            "rejected" => Some(SubmissionStatus::Rejected),
            "cancelled" => Some(SubmissionStatus::Cancelled),
            _ => None,
        }
    }

    /// Counts toward point totals.
    pub fn is_approved(&self) -> bool {
        matches!(self, SubmissionStatus::Approved | SubmissionStatus::AutoApproved)
    }

    /// No longer pending; officer-tier callers cannot move it again.
    pub fn is_decided(&self) -> bool {
        !matches!(self, SubmissionStatus::Pending)
    }
}

/// Provenance tags embedded in officer notes, e.g. `<approved by staff_jdoe>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    AddedBy(String),
    ApprovedBy(String),
}

impl Provenance {
    pub fn tag(&self) -> String {
        match self {
            Provenance::AddedBy(id) => format!("<added by {}>", id),
            Provenance::ApprovedBy(id) => format!("<approved by {}>", id),
        }
    }

    pub fn parse(notes: &str) -> Option<Self> {
        let inner = notes.trim().strip_prefix('<')?.strip_suffix('>')?;
        if let Some(id) = inner.strip_prefix("added by ") {
            return Some(Provenance::AddedBy(id.to_string()));
        }
        if let Some(id) = inner.strip_prefix("approved by ") {
            return Some(Provenance::ApprovedBy(id.to_string()));
        }
        None
    }
}

/// One submission row as held by an officer's editing session. Ids are
/// client-supplied strings; rows with an id that is empty or not a UUID are
/// skipped during reconciliation rather than failing the whole snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionEntry {
    #[serde(default)]
    pub id: String,
    pub member_id: String,
    pub event_id: String,
    pub submission_type: String,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub officer_notes: Option<String>,
    #[serde(default)]
    pub upload_link: Option<String>,
    #[serde(default)]
    pub event_date: Option<DateTime<Utc>>,
}

impl SubmissionEntry {
    pub fn parsed_id(&self) -> Option<Uuid> {
        if self.id.is_empty() {
            return None;
        }
        Uuid::parse_str(&self.id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            SubmissionStatus::Pending,
            SubmissionStatus::AutoApproved,
            SubmissionStatus::Approved,
            SubmissionStatus::Rejected,
            SubmissionStatus::Cancelled,
        ] {
            assert_eq!(SubmissionStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(SubmissionStatus::from_str("denied"), None);
    }

    #[test]
    fn test_status_classes() {
        assert!(SubmissionStatus::Approved.is_approved());
        assert!(SubmissionStatus::AutoApproved.is_approved());
        assert!(!SubmissionStatus::Pending.is_approved());
        assert!(!SubmissionStatus::Pending.is_decided());
        assert!(SubmissionStatus::Rejected.is_decided());
    }

    #[test]
    fn test_provenance_tags() {
        let tag = Provenance::ApprovedBy("staff_jdoe".to_string()).tag();
        assert_eq!(tag, "<approved by staff_jdoe>");
        assert_eq!(
            Provenance::parse(&tag),
            Some(Provenance::ApprovedBy("staff_jdoe".to_string()))
        );
        assert_eq!(
            Provenance::parse("<added by doe.jane>"),
            Some(Provenance::AddedBy("doe.jane".to_string()))
        );
        assert_eq!(Provenance::parse("just a note"), None);
    }

    #[test]
    fn test_entry_id_parsing() {
        let mut entry = SubmissionEntry {
            id: String::new(),
            member_id: "doe.jane".to_string(),
            event_id: "fall_kickoff".to_string(),
            submission_type: "service".to_string(),
            status: SubmissionStatus::Pending,
            description: None,
            officer_notes: None,
            upload_link: None,
            event_date: None,
        };
        assert_eq!(entry.parsed_id(), None);
        entry.id = "not-a-uuid".to_string();
        assert_eq!(entry.parsed_id(), None);
        let id = Uuid::new_v4();
        entry.id = id.to_string();
        assert_eq!(entry.parsed_id(), Some(id));
    }
}
