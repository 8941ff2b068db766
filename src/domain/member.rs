use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub role_name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Member roles, ordered by privilege: owner > staff > officer > member = participant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Staff,
    Officer,
    Member,
    Participant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Staff => "staff",
            Role::Officer => "officer",
            Role::Member => "member",
            Role::Participant => "participant",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "owner" => Some(Role::Owner),
            "staff" => Some(Role::Staff),
            "officer" => Some(Role::Officer),
            "member" => Some(Role::Member),
            "participant" => Some(Role::Participant),
            _ => None,
        }
    }

    fn privilege(&self) -> u8 {
        match self {
            Role::Owner => 4,
            Role::Staff => 3,
            Role::Officer => 2,
            Role::Member | Role::Participant => 1,
        }
    }

    /// Officers and above may review submissions and save snapshots.
    pub fn is_reviewer(&self) -> bool {
        self.privilege() >= 2
    }

    /// Owner and staff may re-decide submissions and manage staff rows.
    pub fn is_super(&self) -> bool {
        self.privilege() >= 3
    }

    pub fn outranks(&self, other: Role) -> bool {
        self.privilege() > other.privilege()
    }
}

/// Normalize one name component for use in a derived member id.
fn name_token(s: &str) -> String {
    s.trim().to_lowercase().replace(' ', "_")
}

/// Canonical member id derived from `(lastName, firstName)`, e.g. "doe.john".
/// Renaming a member therefore produces a new id; reconciliation remaps
/// referencing submissions before persisting.
pub fn member_slug_id(last_name: &str, first_name: &str) -> String {
    format!("{}.{}", name_token(last_name), name_token(first_name))
}

/// Canonical id for staff and officer accounts, derived from the local part
/// of their email, e.g. "staff_jdoe".
pub fn staff_member_id(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    format!("staff_{}", local)
}

/// One roster row as submitted by the bulk member editor. Client-held ids
/// are advisory only; the canonical id is always recomputed server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberEntry {
    #[serde(default)]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// One officer-roster row. The id is derived from the email local part for
/// new rows; existing rows are matched by stored id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfficerEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role_name: String,
    #[serde(default)]
    pub email: String,
}
