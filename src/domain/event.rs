use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Sentinel event id for manually granted bonus points. Submissions may
/// reference it, but no event row with this id ever exists.
pub const POINT_BOOST_EVENT_ID: &str = "<point_boost>";

pub const VERIFICATION_CODE_LEN: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub event_type: String,
    pub has_qr_submission: bool,
    pub needs_additional_info: bool,
    pub verification_code: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Canonical event id derived from the event name: trimmed, lowercased,
/// spaces replaced with underscores.
pub fn event_slug_id(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Random 6-character alphanumeric code members type in (or scan) to
/// self-verify attendance at an event.
pub fn generate_verification_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(VERIFICATION_CODE_LEN)
        .map(char::from)
        .collect()
}

/// One event row as submitted by the bulk event editor. The id is
/// recomputed from the name server-side; rows with an empty name are skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEntry {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub event_type: String,
    #[serde(default)]
    pub has_qr_submission: bool,
    #[serde(default)]
    pub needs_additional_info: bool,
    #[serde(default)]
    pub verification_code: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}
